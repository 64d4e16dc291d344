//! clinic-portal - data-access service for the clinic program portal
//!
//! Resolves configuration (CLI > environment > config file > defaults),
//! opens the SQLite store and serves the JSON API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clinic_common::config::{
    ConfigOverrides, PortalConfig, ENV_BIND, ENV_CONFIG_FILE, ENV_DATABASE, ENV_SEMESTER,
    ENV_SERVICE_KEY, ENV_UPLOADS,
};
use clinic_common::db::init_database;
use clinic_portal::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for clinic-portal
#[derive(Parser, Debug)]
#[command(name = "clinic-portal")]
#[command(about = "Data-access service for the clinic program portal")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = ENV_CONFIG_FILE)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5740
    #[arg(short, long, env = ENV_BIND)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = ENV_DATABASE)]
    database: Option<PathBuf>,

    /// Directory uploaded files are stored in
    #[arg(short, long, env = ENV_UPLOADS)]
    uploads: Option<PathBuf>,

    /// Key required in `x-api-key` on /api routes
    #[arg(long, env = ENV_SERVICE_KEY)]
    service_key: Option<String>,

    /// Semester label used when a request names none
    #[arg(long, env = ENV_SEMESTER)]
    semester: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_file: args.config,
            bind: args.bind,
            database_path: args.database,
            uploads_dir: args.uploads,
            service_key: args.service_key,
            default_semester: args.semester,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any database work
    info!(
        "Starting clinic-portal v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = PortalConfig::resolve(args.into()).context("Failed to resolve configuration")?;
    config.ensure_directories()?;

    info!("Database path: {}", config.database_path.display());
    info!("Uploads directory: {}", config.uploads_dir.display());
    info!("Default semester: {}", config.default_semester);
    if config.service_key.is_none() {
        warn!("No service key configured; /api routes are open");
    }

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let bind = config.bind.clone();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("clinic-portal listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

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
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
