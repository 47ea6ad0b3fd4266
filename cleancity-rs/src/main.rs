//! cleancity-rs - Observation record service
//!
//! Loads configuration, opens the database under the root folder, brings up
//! the classifier and serves the HTTP API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use cleancity_common::config::{
    load_toml_config, RootFolderInitializer, RootFolderResolver, ROOT_FOLDER_ENV,
};
use cleancity_common::db::init_database;
use cleancity_rs::classifier::{ClassificationGateway, StaticScoreModel};
use cleancity_rs::store::RecordStore;
use cleancity_rs::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cleancity-rs
#[derive(Parser, Debug)]
#[command(name = "cleancity-rs")]
#[command(about = "Waste observation ingestion, validation and aggregation service")]
#[command(version)]
struct Args {
    /// Root folder holding the database and uploaded images
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long, env = "CLEANCITY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file
    #[arg(short, long, env = "CLEANCITY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;

    // RUST_LOG wins over the config file level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cleancity_rs={0},cleancity_common={0},tower_http={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting CleanCity record service (cleancity-rs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder)
        .with_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to prepare root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let pool = init_database(&initializer.database_path())
        .await
        .context("Failed to open database")?;
    let store = RecordStore::open(pool)
        .await
        .context("Failed to open record store")?;

    let gateway = Arc::new(ClassificationGateway::not_ready());
    if config.classifier.enabled {
        match StaticScoreModel::from_config(&config.classifier) {
            Ok(model) => {
                gateway.initialize(Arc::new(model));
                info!(categories = ?config.classifier.categories, "Classifier ready");
            }
            Err(e) => warn!("Classifier failed to load, uploads will be unclassified: {}", e),
        }
    } else {
        info!("Classifier disabled, uploads will be unclassified");
    }

    if config.admin_token.is_none() {
        warn!("No admin_token configured; admin routes are open");
    }

    let state = AppState::new(
        store,
        gateway,
        initializer.uploads_path(),
        config.aggregation.clone(),
    )
    .with_admin_token(config.admin_token.clone());
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("cleancity-rs listening on http://{}", addr);
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
