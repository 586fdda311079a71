// Suricata HTTP API alert source
use crate::application::alert_source::AlertSource;
use crate::domain::alert::AlertItem;
use crate::domain::eve::alert_item_from_eve;
use crate::infrastructure::config::MIN_POLL_INTERVAL;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected payload from {url}: expected a list of records")]
    Payload { url: String },
}

/// Raw access to the Suricata API endpoints
#[async_trait]
pub trait SuricataApi: Send + Sync {
    /// `GET /alerts`
    async fn fetch_alerts(&self) -> Result<Vec<Value>, SourceError>;

    /// `GET /logs`
    async fn fetch_logs(&self) -> Result<Vec<Value>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct SuricataHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl SuricataHttpClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_records(&self, endpoint: &str, key: &str) -> Result<Vec<Value>, SourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let http_err = |source| SourceError::Http {
            url: url.clone(),
            source,
        };

        let body = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?
            .text()
            .await
            .map_err(http_err)?;
        let payload: Value = serde_json::from_str(&body).map_err(|source| SourceError::Json {
            url: url.clone(),
            source,
        })?;

        records_from_payload(payload, key).ok_or(SourceError::Payload { url })
    }
}

#[async_trait]
impl SuricataApi for SuricataHttpClient {
    async fn fetch_alerts(&self) -> Result<Vec<Value>, SourceError> {
        self.fetch_records("alerts", "alerts").await
    }

    async fn fetch_logs(&self) -> Result<Vec<Value>, SourceError> {
        self.fetch_records("logs", "logs").await
    }
}

/// Accepts `{"<key>": [...]}` or a bare array
fn records_from_payload(payload: Value, key: &str) -> Option<Vec<Value>> {
    match payload {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(records)) => Some(records),
            None => Some(Vec::new()),
            Some(_) => None,
        },
        _ => None,
    }
}

/// Polls the API and emits records that were not in the previous response
pub struct HttpAlertSource<A> {
    api: A,
    label: String,
    poll_interval: Duration,
}

impl HttpAlertSource<SuricataHttpClient> {
    pub fn from_url(base_url: String, poll_interval: Duration) -> Self {
        let label = format!("Suricata API {}", base_url);
        Self::new(SuricataHttpClient::new(base_url), label, poll_interval)
    }
}

impl<A: SuricataApi + 'static> HttpAlertSource<A> {
    pub fn new(api: A, label: String, poll_interval: Duration) -> Self {
        Self {
            api,
            label,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// One round of raw records. Failed requests are logged and count as empty.
    async fn poll_once(&self) -> Vec<Value> {
        let alerts = self.api.fetch_alerts().await.unwrap_or_else(|e| {
            tracing::error!("Error fetching alerts: {}", e);
            Vec::new()
        });
        let logs = self.api.fetch_logs().await.unwrap_or_else(|e| {
            tracing::error!("Error fetching logs: {}", e);
            Vec::new()
        });

        alerts.into_iter().chain(logs).collect()
    }
}

impl<A: SuricataApi + 'static> AlertSource for HttpAlertSource<A> {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn alerts(self: Box<Self>) -> BoxStream<'static, AlertItem> {
        async_stream::stream! {
            // Keyed on the raw record: mapping stamps timestamp-less records with `now`
            let mut seen: HashSet<String> = HashSet::new();
            let mut interval = tokio::time::interval(self.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let batch = self.poll_once().await;

                let mut current = HashSet::with_capacity(batch.len());
                for record in batch {
                    let key = record.to_string();
                    let fresh = !seen.contains(&key);
                    if !current.insert(key) || !fresh {
                        continue;
                    }
                    if let Some(item) = alert_item_from_eve(record) {
                        yield item;
                    }
                }
                seen = current;
            }
        }
        .boxed()
    }
}
