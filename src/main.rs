//! Liquidation Monitor
//!
//! Background liquidation monitor for a demo lending dashboard.
//! Features:
//! - Interval scanning of every borrowing position
//! - Health factor evaluation against runtime-tunable parameters
//! - Partial liquidations with an audit trail and event log
//! - Operator HTTP API for start/stop, config, stats and manual triggers

mod demo;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use monitor_core::{load_config, Collaborators, LiquidationEngine, Scheduler};
use monitor_store::InMemoryStore;

/// Environment variable names.
mod env {
    /// `json` switches log output to JSON lines
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    // MONITOR_CONFIG / MONITOR_PROFILE select the config, MONITOR_* vars override it
    let config = load_config()?;
    config.log_config();

    info!("Starting liquidation monitor");

    let store = Arc::new(InMemoryStore::new());
    if config.demo.seed {
        demo::seed(&store)?;
    }

    let engine = Arc::new(LiquidationEngine::new(
        Collaborators::from_store(store),
        config.liquidation.clone(),
        config.scheduler.user_scan_concurrency,
    ));
    let scheduler = Arc::new(Scheduler::new(engine, config.scheduler.tick_interval()));

    if config.scheduler.autostart {
        scheduler.start();
    }

    monitor_api::serve(&config.server.bind_addr, scheduler.clone(), shutdown_signal()).await?;

    info!("Waiting for scheduler to finish");
    scheduler.shutdown().await;
    info!("Liquidation monitor stopped");

    Ok(())
}

fn init_tracing() {
    let json = std::env::var(env::LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,monitor_core=debug,monitor_api=debug")),
        )
        .init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!(error = %err, "Failed to listen for shutdown signal"),
    }
}
