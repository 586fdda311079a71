// Source trait for alert producers
use crate::domain::alert::AlertItem;
use futures::stream::BoxStream;

/// A producer of dashboard alerts (eve.json follower, Suricata HTTP API, ...)
pub trait AlertSource: Send {
    /// Short label used in logs
    fn describe(&self) -> String;

    /// Turn the source into a stream of alerts, oldest first.
    /// Sources that follow live data never end.
    fn alerts(self: Box<Self>) -> BoxStream<'static, AlertItem>;
}
