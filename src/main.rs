use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edenmind_api::clock::{Clock, SystemClock};
use edenmind_api::config::{AppConfig, Environment};
use edenmind_api::database::{MemoryStore, PgStore, Store};
use edenmind_api::services::{ask_service, AskService};
use edenmind_api::{app, AppState};

#[derive(Parser)]
#[command(name = "edenmind-api")]
#[command(about = "EdenMind wellness backend")]
#[command(version)]
struct Cli {
    /// Interface to bind (overrides EDENMIND_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides EDENMIND_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Use the in-memory store even when DATABASE_URL is set (development only)
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("edenmind_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = edenmind_api::config::config().clone();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting EdenMind API in {:?} mode", config.environment);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ask: Arc<dyn AskService> = Arc::from(
        ask_service::from_config(&config.ask).context("failed to build chat assistant client")?,
    );
    if config.ask.api_key.is_none() {
        tracing::warn!("ASK_API_KEY is not set; chat queries will fail");
    }

    let use_memory = cli.in_memory || config.database.url.is_none();
    if use_memory && config.environment != Environment::Development {
        anyhow::bail!("the in-memory store is only available in development");
    }

    if use_memory {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        serve(config, Arc::new(MemoryStore::new()), clock, ask).await
    } else {
        let store = Arc::new(
            PgStore::connect(&config.database)
                .await
                .context("failed to connect to the database")?,
        );
        let result = serve(config, store.clone(), clock, ask).await;
        store.close().await;
        result
    }
}

async fn serve<S>(
    config: AppConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ask: Arc<dyn AskService>,
) -> anyhow::Result<()>
where
    S: Store + 'static,
{
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, clock, ask).context("failed to build token codec")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("EdenMind API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
