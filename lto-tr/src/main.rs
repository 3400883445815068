//! lto-tr (Track Reorder) - Main entry point
//!
//! Serves the upload, ordering, rename and download UI for LANDR exports.
//! Configuration is resolved CLI > environment > TOML file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lto_common::config::{CliOverrides, ServiceConfig, TomlConfig, ENV_CONFIG};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lto_tr::{build_router, AppState};

/// Command-line arguments for lto-tr
#[derive(Parser, Debug)]
#[command(name = "lto-tr")]
#[command(about = "Order, rename and bundle LANDR track exports")]
#[command(version)]
struct Args {
    /// Config file (TOML); defaults to the platform config directory
    #[arg(short, long, env = ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum request body size in bytes for uploads
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Filename offered for the download archive
    #[arg(long)]
    archive_name: Option<String>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
            archive_name: self.archive_name.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file = TomlConfig::discover(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServiceConfig::resolve(&args.overrides(), &file)
        .context("Invalid service configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting LANDR Track Order (lto-tr) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &args.config {
        info!("Config file: {}", path.display());
    }
    info!(
        "Upload limit {} bytes, archive name {}",
        config.max_upload_bytes, config.archive_name
    );

    let addr = config.bind_address();
    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("lto-tr listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
