// Dashboard renderer - Re-renders the alert list on every pushed update
use crate::application::render_target::{RenderError, RenderTarget};
use crate::domain::alert::AlertItem;
use tokio::sync::mpsc;

/// Inbound events from the push channel, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Handshake completed
    Connected,
    Update(UpdatePayload),
    /// Any event the dashboard does not consume
    Other { event: String },
    /// Peer closed the channel
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    Items {
        items: Vec<AlertItem>,
        /// Entries dropped because they lacked a string timestamp or message
        rejected: usize,
    },
    /// `data` was not a list
    Malformed { found: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct DashboardRenderer<T> {
    target: T,
    state: ConnectionState,
    handshakes: u32,
    renders: u64,
}

impl<T: RenderTarget> DashboardRenderer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            state: ConnectionState::Disconnected,
            handshakes: 0,
            renders: 0,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of handshakes confirmed so far
    pub fn handshakes(&self) -> u32 {
        self.handshakes
    }

    /// Number of completed full re-renders
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.handshakes += 1;
        tracing::info!(handshakes = self.handshakes, "WebSocket connected");
    }

    /// Replace everything in the container with `items`, in order.
    pub fn on_update(&mut self, items: &[AlertItem]) -> Result<(), RenderError> {
        self.target.clear()?;
        for item in items {
            self.target.append(item)?;
        }
        self.target.present()?;

        self.renders += 1;
        tracing::debug!(count = items.len(), "Rendered alert list");
        Ok(())
    }

    /// Handle one inbound event. Returns `false` once the channel is closed.
    pub fn handle(&mut self, event: ChannelEvent) -> Result<bool, RenderError> {
        match event {
            ChannelEvent::Connected => self.on_connected(),
            ChannelEvent::Update(UpdatePayload::Items { items, rejected }) => {
                if rejected > 0 {
                    tracing::warn!(rejected, "Skipped alert entries without string timestamp/message");
                }
                self.on_update(&items)?;
            }
            ChannelEvent::Update(UpdatePayload::Malformed { found }) => {
                tracing::warn!("Ignoring update_data payload: expected a list, got {}", found);
            }
            ChannelEvent::Other { event } => {
                tracing::debug!("Ignoring event {}", event);
            }
            ChannelEvent::Closed => {
                tracing::info!("Push channel closed");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Consume events one at a time until the channel closes.
    /// A render target failure stops the loop and is returned.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ChannelEvent>) -> Result<(), RenderError> {
        while let Some(event) = events.recv().await {
            if !self.handle(event)? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::DASHBOARD_CONTAINER_ID;
    use crate::infrastructure::dom::{DocumentTarget, DomDocument};

    fn renderer() -> DashboardRenderer<DocumentTarget> {
        let document = DomDocument::new().with_container(DASHBOARD_CONTAINER_ID);
        DashboardRenderer::new(DocumentTarget::new(document, DASHBOARD_CONTAINER_ID))
    }

    fn rendered(renderer: &DashboardRenderer<DocumentTarget>) -> Vec<String> {
        renderer
            .target()
            .container()
            .unwrap()
            .children()
            .iter()
            .map(|e| e.text_content())
            .collect()
    }

    fn items(n: usize) -> Vec<AlertItem> {
        (0..n)
            .map(|i| AlertItem::new(format!("12:00:{:02}", i), format!("alert {}", i)))
            .collect()
    }

    #[test]
    fn test_renders_items_in_order() {
        for n in [0, 1, 2, 7, 50] {
            let mut renderer = renderer();
            let batch = items(n);
            renderer.on_update(&batch).unwrap();

            let expected: Vec<String> = batch
                .iter()
                .map(|i| format!("{}: {}", i.timestamp, i.message))
                .collect();
            assert_eq!(rendered(&renderer), expected);
        }
    }

    #[test]
    fn test_single_alert_scenario() {
        let mut renderer = renderer();
        renderer
            .on_update(&[AlertItem::new("12:00:01", "disk full")])
            .unwrap();

        let container = renderer.target().container().unwrap();
        assert_eq!(container.children().len(), 1);
        let child = &container.children()[0];
        assert_eq!(child.class_name, "alert-item");
        assert!(child.text_content().contains("12:00:01"));
        assert!(child.text_content().contains("disk full"));
    }

    #[test]
    fn test_empty_update_clears() {
        let mut renderer = renderer();
        renderer.on_update(&items(3)).unwrap();
        renderer.on_update(&[]).unwrap();
        assert!(rendered(&renderer).is_empty());
        assert_eq!(renderer.renders(), 2);
    }

    #[test]
    fn test_update_overwrites_previous() {
        let mut renderer = renderer();
        renderer.on_update(&items(5)).unwrap();

        let b = vec![AlertItem::new("13:00:00", "link down")];
        renderer.on_update(&b).unwrap();
        assert_eq!(rendered(&renderer), vec!["13:00:00: link down".to_string()]);
    }

    #[test]
    fn test_connected_counts_each_handshake() {
        let mut renderer = renderer();
        assert_eq!(renderer.state(), ConnectionState::Disconnected);

        renderer.handle(ChannelEvent::Connected).unwrap();
        assert_eq!(renderer.state(), ConnectionState::Connected);
        assert_eq!(renderer.handshakes(), 1);

        // Updates and other events do not count as handshakes
        renderer
            .handle(ChannelEvent::Update(UpdatePayload::Items { items: items(1), rejected: 0 }))
            .unwrap();
        renderer
            .handle(ChannelEvent::Other { event: "response".to_string() })
            .unwrap();
        assert_eq!(renderer.handshakes(), 1);
    }

    #[test]
    fn test_malformed_update_is_noop() {
        let mut renderer = renderer();
        renderer.on_update(&items(2)).unwrap();

        let keep_going = renderer
            .handle(ChannelEvent::Update(UpdatePayload::Malformed { found: "string" }))
            .unwrap();
        assert!(keep_going);
        assert_eq!(rendered(&renderer).len(), 2);
        assert_eq!(renderer.renders(), 1);
    }

    #[test]
    fn test_missing_container_fails_loudly() {
        let target = DocumentTarget::new(DomDocument::new(), DASHBOARD_CONTAINER_ID);
        let mut renderer = DashboardRenderer::new(target);
        let err = renderer.on_update(&items(1)).unwrap_err();
        assert!(matches!(err, RenderError::MissingContainer(_)));
    }

    #[tokio::test]
    async fn test_run_processes_events_in_order() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ChannelEvent::Connected).await.unwrap();
        tx.send(ChannelEvent::Update(UpdatePayload::Items { items: items(3), rejected: 0 }))
            .await
            .unwrap();
        tx.send(ChannelEvent::Update(UpdatePayload::Items {
            items: vec![AlertItem::new("t", "last")],
            rejected: 1,
        }))
        .await
        .unwrap();
        tx.send(ChannelEvent::Closed).await.unwrap();
        // Never handled: the loop stops at Closed
        tx.send(ChannelEvent::Update(UpdatePayload::Items { items: items(9), rejected: 0 }))
            .await
            .unwrap();

        let mut renderer = renderer();
        renderer.run(rx).await.unwrap();

        assert_eq!(renderer.handshakes(), 1);
        assert_eq!(renderer.renders(), 2);
        assert_eq!(rendered(&renderer), vec!["t: last".to_string()]);
    }

    #[tokio::test]
    async fn test_run_stops_on_render_error() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(ChannelEvent::Update(UpdatePayload::Items { items: items(1), rejected: 0 }))
            .await
            .unwrap();
        drop(tx);

        let mut renderer = DashboardRenderer::new(DocumentTarget::new(DomDocument::new(), DASHBOARD_CONTAINER_ID));
        assert!(renderer.run(rx).await.is_err());
    }
}
