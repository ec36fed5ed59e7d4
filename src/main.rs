//! scholarmetrics - citation metrics endpoint
//!
//! Serves `GET /api/scholar` for the author configured in the environment.
//!
//! ```bash
//! SERPAPI_KEY=... SCHOLAR_AUTHOR_ID=DGm9l2wAAAAJ scholarmetrics --port 3000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scholarmetrics::config::Config;
use scholarmetrics::server::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Citation metrics resolver - HTTP service
#[derive(Parser)]
#[command(name = "scholarmetrics")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, env = "SCHOLAR_LOG_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SCHOLAR_LOG_JSON")]
    log_json: bool,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let config = Config::from_env().context("Invalid configuration")?;
    info!(config = ?config, "Loaded configuration");

    run_server(&config, cli.host, cli.port).await
}

async fn run_server(config: &Config, host: String, port: u16) -> Result<()> {
    let state = AppState::from_config(config).context("Failed to build data sources")?;
    let app = server::router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
