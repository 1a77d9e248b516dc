//! dirsync engine - Main Entry Point
//!
//! Composition root: wires the SQLite substrate, the LDAP synchronizer
//! factory, the recurring sync trigger, the worker loop and the JSON-RPC
//! surface.

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use dirsync_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use dirsync_connector_ldap::LdapSynchronizerFactory;
use dirsync_core::application::worker::constants::{
    DEFAULT_RESULT_RETENTION_MS, DEFAULT_SYNC_INTERVAL_MINUTES,
};
use dirsync_core::application::{
    MaintenanceScheduler, RecoveryService, SyncJobRunner, SyncTrigger, TimeoutConfig, Worker,
};
use dirsync_core::port::cancel_channel;
use dirsync_core::port::id_provider::UuidProvider;
use dirsync_core::port::time_provider::SystemTimeProvider;
use dirsync_core::port::MaintenanceConfig;
use dirsync_infra_sqlite::{
    create_pool, run_migrations, SqliteIdentityStore, SqliteJobQueue, SqliteMaintenance,
    SqliteResultStore, SqliteSourceRepository,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.dirsync/dirsync.db";

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON format for production)
    let log_format = std::env::var("DIRSYNC_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("dirsync=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("dirsync engine v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let db_path = std::env::var("DIRSYNC_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let rpc_port: u16 = std::env::var("DIRSYNC_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9533);

    let sync_interval_minutes = env_u64(
        "DIRSYNC_SYNC_INTERVAL_MINUTES",
        DEFAULT_SYNC_INTERVAL_MINUTES,
    );

    // Both caps default to 2 hours; a shorter soft cap gives synchronizers a
    // cooperative grace window before the hard abort.
    let timeouts = TimeoutConfig {
        soft_limit: Duration::from_secs(env_u64("DIRSYNC_SOFT_TIME_LIMIT_SECS", 2 * 60 * 60)),
        hard_limit: Duration::from_secs(env_u64("DIRSYNC_HARD_TIME_LIMIT_SECS", 2 * 60 * 60)),
    };

    let result_retention_ms = env_u64(
        "DIRSYNC_RESULT_RETENTION_SECS",
        (DEFAULT_RESULT_RETENTION_MS / 1000) as u64,
    ) as i64
        * 1000;

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let source_repo = Arc::new(SqliteSourceRepository::new(pool.clone()));
    let queue = Arc::new(SqliteJobQueue::new(pool.clone(), time_provider.clone()));
    let results = Arc::new(SqliteResultStore::new(pool.clone(), time_provider.clone()));
    let identity_store = Arc::new(SqliteIdentityStore::new(pool.clone()));

    let factory = Arc::new(LdapSynchronizerFactory::new(identity_store));

    let runner = Arc::new(SyncJobRunner::new(
        source_repo.clone(),
        factory,
        results.clone(),
        time_provider.clone(),
        result_retention_ms,
    ));

    // 5. Run crash recovery
    info!("Running crash recovery...");
    let recovery_service = RecoveryService::new(
        queue.clone(),
        time_provider.clone(),
        None, // Use default recovery window
    );

    match recovery_service.recover_orphaned_jobs().await {
        Ok(count) => info!(recovered_jobs = count, "Crash recovery completed"),
        Err(e) => tracing::error!(error = ?e, "Crash recovery failed"),
    }

    // 6. Initialize maintenance service (needed for RPC server)
    let maintenance = Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone()));

    // 7. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_handler = RpcHandler::new(
        source_repo.clone(),
        source_repo.clone(),
        queue.clone(),
        results.clone(),
        id_provider.clone(),
        time_provider.clone(),
        maintenance.clone(),
    );
    let rpc_server = RpcServer::new(rpc_config, rpc_handler);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 8. Start Worker (job processing loop)
    info!("Starting sync worker...");
    let (shutdown_tx, shutdown_rx) = cancel_channel();

    let worker = Worker::new(queue.clone(), runner, time_provider.clone(), timeouts);

    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(shutdown_rx).await {
            tracing::error!(error = ?e, "Sync worker failed");
        }
    });

    // 9. Start the recurring sync trigger
    info!(
        interval_minutes = sync_interval_minutes,
        "Starting sync trigger..."
    );
    let sync_trigger = SyncTrigger::new(
        source_repo.clone(),
        queue.clone(),
        id_provider,
        time_provider.clone(),
        sync_interval_minutes,
    );

    tokio::spawn(async move {
        sync_trigger.run().await;
    });

    // 10. Start Maintenance Scheduler
    info!("Starting maintenance scheduler...");
    let maintenance_config = MaintenanceConfig::default(); // 7 days job retention
    let maintenance_scheduler = MaintenanceScheduler::new(
        maintenance,
        maintenance_config,
        24, // Run every 24 hours
    );

    tokio::spawn(async move {
        maintenance_scheduler.run().await;
    });

    info!("System ready. Reconciling directory sources.");
    info!("Press Ctrl+C to shutdown");

    // 11. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 12. Graceful shutdown
    shutdown_tx.cancel();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), worker_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
