use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard";
pub const EVE_PATH_ENV: &str = "SURICATA_EVE_PATH";
pub const ENV_PREFIX: &str = "DASHBOARD";
/// Floor for every polling period; zero would spin or stall the pollers
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub source: SourceSettings,
    pub dashboard: DashboardSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    /// `http(s)://` for the Suricata API, `file://` for an eve.json path
    pub url: Option<String>,
    pub eve_path: Option<String>,
    pub poll_interval_ms: u64,
    pub backlog_lines: usize,
    pub http_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub window_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    pub endpoint: String,
}

/// Where alerts come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    EveFile(PathBuf),
    HttpApi(String),
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SourceSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_poll_interval(&self) -> Duration {
        Duration::from_millis(self.http_poll_interval_ms)
    }

    /// Resolve the configured source: explicit eve path, then the source url
    /// (`file://` or http), then `SURICATA_EVE_PATH`, then the platform default.
    /// An eve path that does not exist falls back to a known install location.
    pub fn resolve(&self, env_eve_path: Option<String>) -> SourceKind {
        let url = self.url.as_deref().filter(|u| !u.is_empty());

        let path = if let Some(path) = self.eve_path.as_deref().filter(|p| !p.is_empty()) {
            PathBuf::from(path)
        } else if let Some(url) = url {
            match url.strip_prefix("file://") {
                Some(path) => PathBuf::from(path),
                None => return SourceKind::HttpApi(url.trim_end_matches('/').to_string()),
            }
        } else if let Some(path) = env_eve_path.filter(|p| !p.is_empty()) {
            PathBuf::from(path)
        } else {
            default_eve_path()
        };

        SourceKind::EveFile(existing_or_fallback(path, FALLBACK_EVE_PATHS))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("source.poll_interval_ms must be greater than zero");
        }
        if self.http_poll_interval_ms == 0 {
            anyhow::bail!("source.http_poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

/// Common Suricata install locations on Windows
#[cfg(windows)]
pub const FALLBACK_EVE_PATHS: &[&str] = &[
    r"C:\Program Files\Suricata\log\eve.json",
    r"C:\ProgramData\Suricata\log\eve.json",
    r"C:\Suricata\log\eve.json",
];

#[cfg(not(windows))]
pub const FALLBACK_EVE_PATHS: &[&str] = &[];

#[cfg(not(windows))]
fn default_eve_path() -> PathBuf {
    PathBuf::from("/var/log/suricata/eve.json")
}

#[cfg(windows)]
fn default_eve_path() -> PathBuf {
    PathBuf::from(FALLBACK_EVE_PATHS[0])
}

/// `path` if it exists, else the first existing candidate, else `path` unchanged
fn existing_or_fallback(path: PathBuf, candidates: &[&str]) -> PathBuf {
    if path.exists() {
        return path;
    }
    match candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        Some(found) => {
            tracing::info!("{} not found, using {}", path.display(), found.display());
            found
        }
        None => path,
    }
}

/// `DASHBOARD__SECTION__KEY` overrides
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(path, environment())
}

fn load_settings_with(path: Option<&Path>, env: config::Environment) -> anyhow::Result<Settings> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
    };

    let settings = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("source.poll_interval_ms", 200)?
        .set_default("source.backlog_lines", 200)?
        .set_default("source.http_poll_interval_ms", 2000)?
        .set_default("dashboard.window_size", 50)?
        .set_default("client.endpoint", "ws://127.0.0.1:5000/ws")?
        .add_source(file)
        .add_source(env)
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.source.validate()?;
    Ok(settings)
}
