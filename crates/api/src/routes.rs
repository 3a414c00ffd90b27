//! Operator route handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use monitor_core::{
    ConfigUpdate, EngineStats, EventId, LiquidationEvent, Scheduler, TriggerResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::ApiError;

type AppState = Arc<Scheduler>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

/// Build the operator router over a scheduler.
pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/liquidation/start", post(start))
        .route("/liquidation/stop", post(stop))
        .route("/liquidation/stats", get(stats))
        .route("/liquidation/events", get(recent_events))
        .route("/liquidation/events/:id", get(event))
        .route("/liquidation/config", post(update_config))
        .route("/liquidation/trigger/:position_id", post(trigger))
        .with_state(scheduler)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn start(State(scheduler): State<AppState>) -> Json<EngineStats> {
    scheduler.start();
    Json(scheduler.stats())
}

async fn stop(State(scheduler): State<AppState>) -> Json<EngineStats> {
    scheduler.stop();
    Json(scheduler.stats())
}

async fn stats(State(scheduler): State<AppState>) -> Json<EngineStats> {
    Json(scheduler.stats())
}

async fn recent_events(
    State(scheduler): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<LiquidationEvent>> {
    Json(scheduler.engine().recent_events(query.limit))
}

async fn event(
    State(scheduler): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Json<LiquidationEvent>, ApiError> {
    Ok(Json(scheduler.engine().event(id)?))
}

#[instrument(skip_all)]
async fn update_config(
    State(scheduler): State<AppState>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<EngineStats>, ApiError> {
    let Json(update) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if update.is_empty() {
        info!("Empty configuration update");
    }

    scheduler.engine().update_config(&update)?;
    Ok(Json(scheduler.stats()))
}

#[instrument(skip(scheduler))]
async fn trigger(
    State(scheduler): State<AppState>,
    position_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<TriggerResult>, ApiError> {
    let Path(position_id) =
        position_id.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let result = scheduler.engine().check_position(position_id).await?;
    Ok(Json(result))
}
