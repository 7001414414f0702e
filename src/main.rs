use homelinks::api::ApiServer;
use homelinks::config::Config;
use homelinks::db::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("homelinks=debug".parse().expect("valid log directive")),
        )
        .init();

    // Load configuration: optional TOML file argument, env vars on top
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config_path = match config_path {
        Some(path) => Some(path),
        None if Path::new("config.toml").exists() => Some(PathBuf::from("config.toml")),
        None => None,
    };

    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    config.validate().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!(
        port = config.server.port,
        db_path = %config.storage.db_path.display(),
        upload_dir = %config.storage.upload_dir.display(),
        max_image_size = config.uploads.max_image_size,
        "Configuration loaded"
    );

    // Open the database; migrations run here, before any request is served
    let db = Arc::new(Database::open(&config.storage.db_path)?);

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = Arc::new(ApiServer::new(&config, Arc::clone(&db), shutdown_rx)?);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal (Ctrl+C or SIGTERM)
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C, shutting down...");
    }

    // Signal shutdown and wait for the server to drain
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;

    db.close();
    info!("Shutdown complete");
    Ok(())
}
