// Main entry point - Dependency injection, server and watch client setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::alert_source::AlertSource;
use crate::application::broadcast_service::AlertBroadcastService;
use crate::application::renderer::DashboardRenderer;
use crate::domain::dashboard::DASHBOARD_CONTAINER_ID;
use crate::infrastructure::config::{load_settings, Settings, SourceKind, EVE_PATH_ENV};
use crate::infrastructure::dom::{DocumentTarget, DomDocument, Presentation};
use crate::infrastructure::eve_tailer::EveTailer;
use crate::infrastructure::http_source::HttpAlertSource;
use crate::infrastructure::push_channel::Connection;
use crate::presentation::app_state::AppState;
use crate::presentation::router::router;

#[derive(Parser)]
#[command(name = "suricata-dashboard", version, about = "Live Suricata alert dashboard")]
struct Cli {
    /// Configuration file (defaults to config/dashboard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow Suricata and push alerts to connected dashboards
    Serve,
    /// Connect to a dashboard server and render its alert list
    Watch {
        /// WebSocket endpoint, e.g. ws://127.0.0.1:5000/ws
        #[arg(long)]
        endpoint: Option<String>,

        /// Write the rendered container to this HTML file instead of stdout
        #[arg(long)]
        html: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => serve(settings).await,
        Command::Watch { endpoint, html } => {
            let endpoint = endpoint.unwrap_or_else(|| settings.client.endpoint.clone());
            watch(&endpoint, html).await
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    // Create alert source (infrastructure layer)
    let source: Box<dyn AlertSource> = match settings.source.resolve(std::env::var(EVE_PATH_ENV).ok()) {
        SourceKind::EveFile(path) => Box::new(EveTailer::new(
            path,
            settings.source.poll_interval(),
            settings.source.backlog_lines,
        )),
        SourceKind::HttpApi(url) => Box::new(HttpAlertSource::from_url(
            url,
            settings.source.http_poll_interval(),
        )),
    };

    // Create services (application layer)
    let broadcast_service = AlertBroadcastService::new(settings.dashboard.window_size);
    let ingest = broadcast_service.clone();
    tokio::spawn(async move { ingest.run(source).await });

    let state = Arc::new(AppState { broadcast_service });

    // Start server (presentation layer)
    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting suricata-dashboard on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn watch(endpoint: &str, html: Option<PathBuf>) -> anyhow::Result<()> {
    let presentation = match html {
        Some(path) => Presentation::HtmlFile(path),
        None => Presentation::Stdout,
    };
    let document = DomDocument::new().with_container(DASHBOARD_CONTAINER_ID);
    let target = DocumentTarget::new(document, DASHBOARD_CONTAINER_ID).with_presentation(presentation);
    let mut renderer = DashboardRenderer::new(target);

    let (connection, events) = Connection::open(endpoint).await?;

    let outcome = tokio::select! {
        result = renderer.run(events) => result,
        _ = shutdown_signal() => Ok(()),
    };

    let endpoint = connection.endpoint().to_string();
    connection.close().await.unwrap_or_else(|e| {
        tracing::debug!("Closing {}: {}", endpoint, e);
    });
    outcome?;

    let displayed = renderer.target().container().map_or(0, |c| c.children().len());
    tracing::info!(
        state = ?renderer.state(),
        handshakes = renderer.handshakes(),
        renders = renderer.renders(),
        displayed,
        "Watch finished"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
