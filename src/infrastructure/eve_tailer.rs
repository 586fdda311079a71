// Suricata eve.json follower - backlog, tailing, rotation and multi-line records
use crate::application::alert_source::AlertSource;
use crate::domain::alert::AlertItem;
use crate::domain::eve::alert_item_from_eve;
use crate::infrastructure::config::{EVE_PATH_ENV, MIN_POLL_INTERVAL};
use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use serde_json::Value;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

/// Bytes read from the end of the file when collecting the backlog
const BACKLOG_TAIL_BYTES: u64 = 65536;
/// A pending multi-line record larger than this is discarded
const MAX_PENDING_BYTES: usize = 1_000_000;
const WAIT_FOR_FILE_INTERVAL: Duration = Duration::from_secs(1);
const REOPEN_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct EveTailer {
    path: PathBuf,
    poll_interval: Duration,
    backlog_lines: usize,
}

impl EveTailer {
    pub fn new(path: PathBuf, poll_interval: Duration, backlog_lines: usize) -> Self {
        Self {
            path,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            backlog_lines,
        }
    }

    /// Raw eve records: the backlog first, then every record appended afterwards
    pub fn events(self) -> impl Stream<Item = Value> + Send + 'static {
        async_stream::stream! {
            let path = wait_for_file(self.path).await;
            tracing::info!("Following {}", path.display());

            // Open before reading the backlog so nothing appended in between is lost
            let mut follower = Follower::open_at_end(&path).await.ok();
            let upto = follower.as_ref().map(|f| f.last_size);
            for event in read_backlog(&path, self.backlog_lines, upto).await {
                yield event;
            }

            let mut assembler = RecordAssembler::default();

            loop {
                if follower.is_none() {
                    match Follower::open_at_end(&path).await {
                        Ok(f) => follower = Some(f),
                        Err(e) => {
                            tracing::debug!("Cannot open {} yet: {}", path.display(), e);
                            tokio::time::sleep(self.poll_interval).await;
                            continue;
                        }
                    }
                }
                let Some(current) = follower.as_mut() else {
                    continue;
                };

                match current.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = assembler.push_line(&line) {
                            yield event;
                        }
                    }
                    Ok(None) => {
                        if let Ok(meta) = tokio::fs::metadata(&path).await {
                            if meta.len() < current.last_size {
                                tracing::info!("{} was truncated or rotated, reopening", path.display());
                                assembler.reset();
                                follower = Follower::open_at_end(&path).await.ok();
                                let upto = follower.as_ref().map(|f| f.last_size);
                                for event in read_backlog(&path, self.backlog_lines, upto).await {
                                    yield event;
                                }
                                continue;
                            }
                            current.last_size = meta.len();
                        }
                        tokio::time::sleep(self.poll_interval).await;
                    }
                    Err(e) => {
                        tracing::warn!("Error reading {}: {}", path.display(), e);
                        follower = None;
                        assembler.reset();
                        tokio::time::sleep(REOPEN_DELAY).await;
                    }
                }
            }
        }
    }
}

impl AlertSource for EveTailer {
    fn describe(&self) -> String {
        format!("eve log {}", self.path.display())
    }

    fn alerts(self: Box<Self>) -> BoxStream<'static, AlertItem> {
        self.events()
            .filter_map(|event| async move { alert_item_from_eve(event) })
            .boxed()
    }
}

/// Wait until the file exists, picking up `SURICATA_EVE_PATH` if it gets set meanwhile
async fn wait_for_file(mut path: PathBuf) -> PathBuf {
    let mut warned = false;
    while !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        if !warned {
            tracing::warn!("Waiting for {} to appear", path.display());
            warned = true;
        }
        tokio::time::sleep(WAIT_FOR_FILE_INTERVAL).await;
        if let Ok(env_path) = std::env::var(EVE_PATH_ENV) {
            if !env_path.is_empty() {
                path = PathBuf::from(env_path);
            }
        }
    }
    path
}

/// Open file positioned at its end, yielding complete lines as they are appended
struct Follower {
    reader: BufReader<File>,
    partial: Vec<u8>,
    last_size: u64,
}

impl Follower {
    async fn open_at_end(path: &Path) -> std::io::Result<Self> {
        let mut file = File::open(path).await?;
        let last_size = file.seek(SeekFrom::End(0)).await?;
        Ok(Self {
            reader: BufReader::new(file),
            partial: Vec::new(),
            last_size,
        })
    }

    /// `Ok(None)` when no complete line is available yet
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.partial).await?;
        if read == 0 || self.partial.last() != Some(&b'\n') {
            return Ok(None);
        }

        let bytes = std::mem::take(&mut self.partial);
        let line = String::from_utf8_lossy(&bytes);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Reassembles records from lines; a record may span several lines.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    pending: String,
}

impl RecordAssembler {
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn push_line(&mut self, line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(event) => {
                if !self.pending.is_empty() {
                    let combined = format!("{}\n{}", self.pending, line);
                    self.pending.clear();
                    if let Ok(whole) = serde_json::from_str::<Value>(&combined) {
                        return Some(whole);
                    }
                }
                Some(event)
            }
            Err(_) => {
                self.pending.push_str(line);
                self.pending.push('\n');
                match serde_json::from_str::<Value>(&self.pending) {
                    Ok(event) => {
                        self.pending.clear();
                        Some(event)
                    }
                    Err(_) => {
                        if self.pending.len() > MAX_PENDING_BYTES {
                            tracing::warn!("Discarding unparseable eve fragment of {} bytes", self.pending.len());
                            self.pending.clear();
                        }
                        None
                    }
                }
            }
        }
    }
}

/// Recent records from the end of the file, or from before `upto` when given
pub async fn read_backlog(path: &Path, backlog_lines: usize, upto: Option<u64>) -> Vec<Value> {
    if backlog_lines == 0 {
        return Vec::new();
    }

    let tail = match read_tail(path, upto).await {
        Ok(tail) => tail,
        Err(e) => {
            tracing::warn!("Cannot read backlog from {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let trimmed = tail.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(whole) = tokio::fs::read(path).await {
            if let Ok(Value::Array(events)) = serde_json::from_slice::<Value>(&whole) {
                let skip = events.len().saturating_sub(backlog_lines);
                return events.into_iter().skip(skip).collect();
            }
        }
    }

    ndjson_backlog(trimmed, backlog_lines)
}

async fn read_tail(path: &Path, upto: Option<u64>) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let size = file.seek(SeekFrom::End(0)).await?;
    let end = upto.map_or(size, |u| u.min(size));
    let start = end.saturating_sub(BACKLOG_TAIL_BYTES);
    file.seek(SeekFrom::Start(start)).await?;

    let mut bytes = Vec::new();
    file.take(end - start).read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse the last `backlog_lines` lines of newline-delimited JSON
pub fn ndjson_backlog(text: &str, backlog_lines: usize) -> Vec<Value> {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(backlog_lines);

    let mut assembler = RecordAssembler::default();
    lines
        .into_iter()
        .skip(skip)
        .filter_map(|line| assembler.push_line(line.trim()))
        .collect()
}
