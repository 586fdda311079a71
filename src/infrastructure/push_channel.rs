// Push-channel client connection over WebSocket
use crate::application::renderer::ChannelEvent;
use crate::infrastructure::wire::decode_frame;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const EVENT_QUEUE_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("failed to send on push channel: {0}")]
    Send(#[source] tungstenite::Error),

    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An open push channel. Inbound frames are decoded by a reader task and
/// delivered, in arrival order, through the receiver returned by `open`.
/// Dropping the connection stops the reader, which ends the receiver.
pub struct Connection {
    endpoint: String,
    writer: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Perform the handshake. The first event on the receiver is always `Connected`.
    pub async fn open(endpoint: &str) -> Result<(Self, mpsc::Receiver<ChannelEvent>), ChannelError> {
        let (ws, _response) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|source| ChannelError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;
        tracing::debug!(endpoint, "WebSocket handshake complete");

        let (writer, mut read) = ws.split();
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let reader = tokio::spawn(async move {
            if tx.send(ChannelEvent::Connected).await.is_err() {
                return;
            }

            while let Some(frame) = read.next().await {
                let event = match frame {
                    Ok(Message::Text(text)) => match decode_frame(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Dropping frame: {}", e);
                            continue;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Push channel error: {}", e);
                        break;
                    }
                };

                if tx.send(event).await.is_err() {
                    // Consumer is gone
                    return;
                }
            }

            let _ = tx.send(ChannelEvent::Closed).await;
        });

        Ok((
            Self {
                endpoint: endpoint.to_string(),
                writer,
                reader,
            },
            rx,
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a close frame and stop the reader task
    pub async fn close(mut self) -> Result<(), ChannelError> {
        let result = self
            .writer
            .send(Message::Close(None))
            .await
            .map_err(ChannelError::Send);
        self.reader.abort();
        tracing::debug!(endpoint = %self.endpoint, "Push channel closed");
        result
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::renderer::UpdatePayload;
    use crate::domain::alert::AlertItem;
    use crate::infrastructure::wire::{encode_greeting, encode_update, GREETING_EVENT};
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Accepts one client, sends the given text frames, then closes
    async fn serve_frames(frames: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }
            let _ = ws.close(None).await;
        });

        format!("ws://{}", addr)
    }

    async fn next(rx: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let endpoint = serve_frames(vec![
            encode_greeting().unwrap(),
            "garbage".to_string(),
            encode_update(&[AlertItem::new("12:00:01", "disk full")]).unwrap(),
        ])
        .await;

        let (connection, mut rx) = Connection::open(&endpoint).await.unwrap();
        assert_eq!(connection.endpoint(), endpoint);

        assert_eq!(next(&mut rx).await, ChannelEvent::Connected);
        assert_eq!(
            next(&mut rx).await,
            ChannelEvent::Other {
                event: GREETING_EVENT.to_string()
            }
        );
        assert_eq!(
            next(&mut rx).await,
            ChannelEvent::Update(UpdatePayload::Items {
                items: vec![AlertItem::new("12:00:01", "disk full")],
                rejected: 0,
            })
        );
        assert_eq!(next(&mut rx).await, ChannelEvent::Closed);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Connection::open(&format!("ws://{}", addr)).await;
        assert!(matches!(result, Err(ChannelError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_drop_stops_reader() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Holds the socket open until the client goes away
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let (connection, mut rx) = Connection::open(&format!("ws://{}", addr)).await.unwrap();
        assert_eq!(next(&mut rx).await, ChannelEvent::Connected);

        drop(connection);
        let after_drop = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(after_drop, None);
    }
}
