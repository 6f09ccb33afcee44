//! ytflow Daemon - Main Entry Point
//! HTTP intake + SQLite state + in-process event bus

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use config::{DaemonConfig, IdStrategy};
use ytflow_api_http::rate_limiter::RateLimiter;
use ytflow_api_http::{AppState, HttpServer};
use ytflow_core::application::submission::SubmissionConfig;
use ytflow_core::application::{shutdown_channel, ReconcileService, SubmissionService};
use ytflow_core::domain::YT_SUBMIT_TOPIC;
use ytflow_core::port::id_provider::{TimestampIdProvider, UuidProvider};
use ytflow_core::port::time_provider::SystemTimeProvider;
use ytflow_core::port::{IdProvider, TimeProvider};
use ytflow_infra_bus::InMemoryEventBus;
use ytflow_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    let _telemetry = telemetry::init(config.log_format)?;

    info!("ytflow daemon v{} starting...", VERSION);
    info!(db_path = %config.db_path, "Initializing database...");

    // 3. Initialize database
    if let Some(dir) = config.db_dir() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let pool = create_pool(&config.database_url())
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = match config.id_strategy {
        IdStrategy::Timestamp => Arc::new(TimestampIdProvider::new(time_provider.clone())),
        IdStrategy::Uuid => Arc::new(UuidProvider),
    };
    let store = Arc::new(SqliteJobStore::new(pool.clone(), time_provider.clone()));
    let bus = Arc::new(InMemoryEventBus::new(config.bus_capacity));

    let service = Arc::new(SubmissionService::with_config(
        store.clone(),
        bus.clone(),
        id_provider,
        time_provider.clone(),
        SubmissionConfig {
            store_timeout: config.store_timeout,
            emit_timeout: config.emit_timeout,
        },
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    // 5. Re-announce jobs whose event may have been lost, once a consumer
    //    of YT.submit has subscribed
    let reconcile_handle = if config.reconcile_enabled() {
        let reconcile = ReconcileService::new(
            store.clone(),
            bus.clone(),
            time_provider.clone(),
            Some(config.reconcile_window_ms),
        )
        .with_emit_timeout(config.emit_timeout);
        let bus = bus.clone();
        let shutdown = shutdown_rx.clone();

        Some(tokio::spawn(async move {
            info!(topic = YT_SUBMIT_TOPIC, "Reconciliation waiting for subscribers");
            tokio::select! {
                _ = bus.wait_for_subscriber(YT_SUBMIT_TOPIC) => {}
                _ = shutdown.wait() => return,
            }

            match reconcile.redeliver_pending().await {
                Ok(report) => info!(
                    scanned = report.scanned,
                    redelivered = report.redelivered,
                    undelivered = report.undelivered,
                    failed = report.failed,
                    "Reconciliation completed"
                ),
                Err(e) => tracing::error!(error = ?e, "Reconciliation failed"),
            }
        }))
    } else {
        None
    };

    // 6. Start HTTP server
    info!("Starting HTTP server...");
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_burst,
        config.rate_limit_rate,
    ));
    let server = HttpServer::new(config.http.clone(), AppState::new(service, rate_limiter));
    let server_handle = server
        .start(shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server start failed: {}", e))?;

    info!(addr = %server_handle.local_addr, "System ready. Accepting submissions");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: drain requests, then close the bus and the pool
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), server_handle.stopped()).await;
    if let Some(handle) = reconcile_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }
    bus.close();
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
