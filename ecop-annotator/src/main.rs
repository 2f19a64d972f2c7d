//! ecop-annotator - poem similarity annotation web service
//!
//! Loads the user directory, title mapping and similarity tables from the
//! data root once at startup, then serves the annotation pages.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecop_annotator::session::generate_secret;
use ecop_annotator::{build_router, env_filter_or, AppState, ServiceSettings};
use ecop_common::config::{load_toml_config_or_default, DataPaths, RootFolderResolver};
use ecop_common::Catalog;

/// Command-line arguments for ecop-annotator
#[derive(Parser, Debug)]
#[command(name = "ecop-annotator")]
#[command(about = "Web service for annotating poem similarity")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/ecop/ecop-annotator.toml)
    #[arg(short, long, env = "ECOP_CONFIG")]
    config: Option<PathBuf>,

    /// Data root holding users.json, the title and similarity tables, the corpus and annotations
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ECOP_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "ECOP_BIND_ADDRESS")]
    bind: Option<String>,

    /// Secret for CSRF tokens (random per process when unset)
    #[arg(long, env = "ECOP_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = load_toml_config_or_default(args.config.as_deref());
    let config = &loaded.config;

    tracing_subscriber::registry()
        .with(env_filter_or(&config.logging.level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ecop-annotator v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log_source();

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml_value(config.root_folder.clone())
        .resolve();
    info!("Root folder: {}", root_folder.display());

    let paths = DataPaths::new(root_folder);
    paths
        .ensure_directories()
        .with_context(|| format!("Failed to create {}", paths.annotations_dir().display()))?;

    let catalog = Catalog::load(&paths);
    catalog.validate();

    let secret_key = match args.secret_key.clone().or_else(|| config.secret_key.clone()) {
        Some(secret) if !secret.trim().is_empty() => secret,
        _ => {
            warn!("No secret_key configured; generated a random one (sessions end on restart)");
            generate_secret()
        }
    };

    let settings = ServiceSettings {
        secret_key,
        poem_extension: config.poem_extension.clone(),
        annotation_layout: config.annotation_layout,
        session_ttl: ServiceSettings::session_ttl_from_minutes(config.session_ttl_minutes),
    };
    info!("Annotation layout: {:?}", settings.annotation_layout);

    let state = AppState::new(catalog, &paths, settings);
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.bind_address.clone());
    let port = args.port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", bind, port))?;

    info!("ecop-annotator listening on http://{}:{}", bind, port);
    info!("Health check: http://{}:{}/health", bind, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
