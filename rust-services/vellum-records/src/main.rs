//! Vellum Records
//!
//! Runs the record store in-process: seeds the default records, rotates the
//! signing key on a schedule, and tears everything down on Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use vellum_config::StoreConfig;
use vellum_keys::Cleanable;
use vellum_logging::{init_logging, LogFormat};
use vellum_records::{RecordManager, RecordService, DEFAULT_RECORDS};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = StoreConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    let log_format: LogFormat = config.log_format.parse()?;
    init_logging("vellum-records", config.log_level(), log_format);

    info!(
        max_backups = config.max_backups,
        rotation_interval_secs = config.rotation_interval_secs,
        "Configuration loaded"
    );

    let manager = Arc::new(
        RecordManager::new(&config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize record manager: {}", e))?,
    );
    let service = RecordService::new(Arc::clone(&manager));

    if config.seed_defaults {
        service.seed(DEFAULT_RECORDS).await;
    }

    let rotation = config
        .rotation_interval()
        .map(|interval| manager.key_manager().spawn_rotation(interval));

    // Wait for shutdown signal
    info!("Vellum record store running. Press Ctrl+C to stop.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    if let Some(rotation) = rotation {
        rotation.abort();
    }
    manager.destroy().await;
    info!("Vellum record store stopped");

    Ok(())
}
