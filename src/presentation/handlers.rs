// HTTP request handlers
use crate::application::broadcast_service::AlertBroadcastService;
use crate::domain::alert::AlertItem;
use crate::infrastructure::wire::{encode_greeting, encode_update};
use crate::presentation::app_state::AppState;
use crate::presentation::pages::{render_dashboard, INDEX_PAGE};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Dashboard page, pre-rendered with the current alerts
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_dashboard(&state.broadcast_service.snapshot()))
}

/// Current alerts as JSON, newest first
pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertItem>> {
    Json(state.broadcast_service.snapshot())
}

/// Push channel: greeting, current list, then every new list as `update_data`
pub async fn push_channel(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let service = state.broadcast_service.clone();
    ws.on_upgrade(move |socket| stream_updates(socket, service))
}

async fn stream_updates(mut socket: WebSocket, service: AlertBroadcastService) {
    // Subscribe before taking the snapshot so no update falls in between
    let mut updates = BroadcastStream::new(service.subscribe());

    if send_text(&mut socket, encode_greeting()).await.is_err() {
        return;
    }
    if send_text(&mut socket, encode_update(&service.snapshot()))
        .await
        .is_err()
    {
        return;
    }
    tracing::debug!("Push client connected");

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(Ok(snapshot)) => {
                    if send_text(&mut socket, encode_update(&snapshot)).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "Push client lagging, skipping to newer snapshots");
                }
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("Push client disconnected");
}

async fn send_text(
    socket: &mut WebSocket,
    payload: serde_json::Result<String>,
) -> Result<(), ()> {
    let text = payload.map_err(|e| {
        tracing::error!("Failed to encode push frame: {}", e);
    })?;
    socket.send(Message::Text(text)).await.map_err(|e| {
        tracing::debug!("Push client send failed: {}", e);
    })
}
