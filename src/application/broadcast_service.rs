// Alert broadcast service - Keeps the recent alert window and fans it out to clients
use crate::application::alert_source::AlertSource;
use crate::domain::alert::AlertItem;
use crate::domain::dashboard::AlertWindow;
use futures::StreamExt;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

pub type Snapshot = Arc<Vec<AlertItem>>;

#[derive(Clone)]
pub struct AlertBroadcastService {
    window: Arc<RwLock<AlertWindow>>,
    tx: broadcast::Sender<Snapshot>,
}

impl AlertBroadcastService {
    pub fn new(window_size: usize) -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            window: Arc::new(RwLock::new(AlertWindow::new(window_size))),
            tx,
        }
    }

    /// Current alert list, newest first
    pub fn snapshot(&self) -> Vec<AlertItem> {
        match self.window.read() {
            Ok(window) => window.to_vec(),
            Err(poisoned) => poisoned.into_inner().to_vec(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Add one alert and push the resulting list to every subscriber
    pub fn ingest(&self, item: AlertItem) {
        let snapshot = {
            let mut window = match self.window.write() {
                Ok(window) => window,
                Err(poisoned) => poisoned.into_inner(),
            };
            window.push(item);
            Arc::new(window.to_vec())
        };
        let size = snapshot.len();

        // No subscribers is fine; the window still holds the data
        let receivers = self.tx.send(snapshot).unwrap_or(0);
        tracing::trace!(receivers, size, "Broadcast alert snapshot");
    }

    /// Drive a source until it ends
    pub async fn run(&self, source: Box<dyn AlertSource>) {
        let name = source.describe();
        tracing::info!("Streaming alerts from {}", name);

        let mut alerts = source.alerts();
        let mut count: u64 = 0;
        while let Some(item) = alerts.next().await {
            self.ingest(item);
            count += 1;
        }

        tracing::warn!("Alert source {} ended after {} alerts", name, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::{self, BoxStream};

    struct FixedSource(Vec<AlertItem>);

    impl AlertSource for FixedSource {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn alerts(self: Box<Self>) -> BoxStream<'static, AlertItem> {
            stream::iter(self.0).boxed()
        }
    }

    #[test]
    fn test_ingest_updates_snapshot() {
        let service = AlertBroadcastService::new(2);
        assert!(service.snapshot().is_empty());

        service.ingest(AlertItem::new("1", "a"));
        service.ingest(AlertItem::new("2", "b"));
        service.ingest(AlertItem::new("3", "c"));

        assert_eq!(
            service.snapshot(),
            vec![AlertItem::new("3", "c"), AlertItem::new("2", "b")]
        );
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots() {
        let service = AlertBroadcastService::new(10);
        let mut rx = service.subscribe();

        service.ingest(AlertItem::new("1", "a"));
        service.ingest(AlertItem::new("2", "b"));

        let first = rx.recv().await.unwrap();
        assert_eq!(*first, vec![AlertItem::new("1", "a")]);
        let second = rx.recv().await.unwrap();
        assert_eq!(
            *second,
            vec![AlertItem::new("2", "b"), AlertItem::new("1", "a")]
        );
    }

    #[tokio::test]
    async fn test_run_drains_source() {
        let service = AlertBroadcastService::new(10);
        let source = FixedSource(vec![AlertItem::new("1", "a"), AlertItem::new("2", "b")]);

        service.run(Box::new(source)).await;

        assert_eq!(
            service.snapshot(),
            vec![AlertItem::new("2", "b"), AlertItem::new("1", "a")]
        );
    }
}
