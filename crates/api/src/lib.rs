//! Operator HTTP API for the liquidation monitor.
//!
//! Routes:
//! - `POST /liquidation/start`, `POST /liquidation/stop`: scheduler control
//! - `GET /liquidation/stats`: engine statistics
//! - `GET /liquidation/events?limit=N`, `GET /liquidation/events/{id}`: event log
//! - `POST /liquidation/config`: partial configuration update
//! - `POST /liquidation/trigger/{positionId}`: manual single-position check
//! - `GET /health`: liveness probe

mod error;
mod routes;

pub use error::ApiError;
pub use routes::router;

use anyhow::{Context, Result};
use monitor_core::Scheduler;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Bind `addr` and serve the operator API until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    scheduler: Arc<Scheduler>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding operator API to {}", addr))?;
    serve_on(listener, scheduler, shutdown).await
}

/// Serve the operator API on an already bound listener.
pub async fn serve_on(
    listener: TcpListener,
    scheduler: Arc<Scheduler>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Operator API listening");

    axum::serve(listener, router(scheduler))
        .with_graceful_shutdown(shutdown)
        .await
        .context("operator API server")?;

    info!("Operator API stopped");
    Ok(())
}
