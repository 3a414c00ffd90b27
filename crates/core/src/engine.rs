//! Liquidation engine: shared state and the work of a single tick.
//!
//! The engine owns the runtime configuration, the event log and the executor.
//! It knows nothing about timing; the scheduler decides when `run_tick` runs.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::{stream, StreamExt};
use monitor_store::{
    Position, PositionId, PositionKind, PositionStore, PriceSource, TransactionLedger,
    UserDirectory,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigUpdate, LiquidationConfig};
use crate::error::MonitorError;
use crate::events::{
    EventId, EventLog, EventStatus, LiquidationEvent, TriggerSource, DEFAULT_EVENT_LIMIT,
};
use crate::executor::LiquidationExecutor;
use crate::health::{evaluate, Evaluation, HealthReport, SkipReason};
use crate::prices::PriceBook;
use crate::stats::{EngineStats, TickReport};

/// External systems the engine reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub positions: Arc<dyn PositionStore>,
    pub prices: Arc<dyn PriceSource>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub users: Arc<dyn UserDirectory>,
}

impl Collaborators {
    /// Use one store for every contract.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PositionStore + PriceSource + TransactionLedger + UserDirectory + 'static,
    {
        Self {
            positions: store.clone(),
            prices: store.clone(),
            ledger: store.clone(),
            users: store,
        }
    }
}

/// Result of a manual single-position check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Skipped { skip: SkipReason },
    Safe { health: HealthReport },
    Liquidated { event: LiquidationEvent },
    Failed { event: LiquidationEvent },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResult {
    pub position_id: PositionId,
    /// False only when a liquidation was attempted and failed
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: TriggerOutcome,
}

impl TriggerResult {
    fn new(position_id: PositionId, outcome: TriggerOutcome) -> Self {
        let (success, message) = match &outcome {
            TriggerOutcome::Skipped { skip } => {
                (true, format!("Position {} skipped: {}", position_id, skip))
            }
            TriggerOutcome::Safe { health } => (
                true,
                format!(
                    "Position {} is healthy (health factor {:.4})",
                    position_id, health.health_factor
                ),
            ),
            TriggerOutcome::Liquidated { event } => (
                true,
                format!(
                    "Position {} liquidated: repaid {} debt, seized {} collateral",
                    position_id, event.liquidated_debt, event.collateral_seized
                ),
            ),
            TriggerOutcome::Failed { event } => (
                false,
                format!(
                    "Liquidation of position {} failed: {}",
                    position_id,
                    event.failure_reason.as_deref().unwrap_or("unknown error")
                ),
            ),
        };

        Self {
            position_id,
            success,
            message,
            outcome,
        }
    }
}

/// Shared liquidation engine state.
pub struct LiquidationEngine {
    positions: Arc<dyn PositionStore>,
    prices: Arc<dyn PriceSource>,
    users: Arc<dyn UserDirectory>,
    executor: LiquidationExecutor,
    events: Arc<EventLog>,

    /// Current parameters; each tick copies them when it starts
    config: RwLock<LiquidationConfig>,

    /// Serialises ticks
    tick_lock: Mutex<()>,
    ticks_completed: AtomicU64,
    last_tick: RwLock<Option<TickReport>>,

    /// Concurrent per-user position reads
    user_scan_concurrency: usize,
}

impl LiquidationEngine {
    pub fn new(
        collaborators: Collaborators,
        config: LiquidationConfig,
        user_scan_concurrency: usize,
    ) -> Self {
        let events = Arc::new(EventLog::new());
        let executor = LiquidationExecutor::new(
            collaborators.positions.clone(),
            collaborators.ledger,
            events.clone(),
        );

        Self {
            positions: collaborators.positions,
            prices: collaborators.prices,
            users: collaborators.users,
            executor,
            events,
            config: RwLock::new(config),
            tick_lock: Mutex::new(()),
            ticks_completed: AtomicU64::new(0),
            last_tick: RwLock::new(None),
            user_scan_concurrency: user_scan_concurrency.max(1),
        }
    }

    /// Snapshot of the current liquidation parameters.
    pub fn config(&self) -> LiquidationConfig {
        self.config.read().clone()
    }

    /// Merge `update` into the configuration. Takes effect on the next tick.
    pub fn update_config(&self, update: &ConfigUpdate) -> Result<LiquidationConfig, MonitorError> {
        let mut config = self.config.write();
        let merged = update.apply(&config).map_err(|err| {
            warn!(error = %err, "Rejected configuration update");
            err
        })?;
        *config = merged.clone();
        drop(config);

        info!(
            liquidation_threshold = merged.liquidation_threshold,
            liquidation_penalty = merged.liquidation_penalty,
            health_factor_threshold = merged.health_factor_threshold,
            max_price_age_secs = ?merged.max_price_age_secs,
            "Liquidation configuration updated"
        );
        Ok(merged)
    }

    /// Most recent events, newest first. `None` uses the default limit.
    pub fn recent_events(&self, limit: Option<usize>) -> Vec<LiquidationEvent> {
        self.events.recent(limit.unwrap_or(DEFAULT_EVENT_LIMIT))
    }

    pub fn event(&self, id: EventId) -> Result<LiquidationEvent, MonitorError> {
        self.events.get(id).ok_or(MonitorError::EventNotFound(id))
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Number of ticks run so far, aborted ones included.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::SeqCst)
    }

    pub fn last_tick(&self) -> Option<TickReport> {
        self.last_tick.read().clone()
    }

    pub fn stats(&self, running: bool) -> EngineStats {
        EngineStats {
            running,
            config: self.config(),
            ticks_completed: self.ticks_completed(),
            last_tick: self.last_tick(),
            events: self.events.summary(),
        }
    }

    /// Run one scan over every borrowing position.
    ///
    /// Never fails: enumeration errors abort the tick and are recorded in the
    /// returned report. Liquidations applied before the abort stay applied.
    #[instrument(skip(self))]
    pub async fn run_tick(&self) -> TickReport {
        let _tick = self.tick_lock.lock().await;
        let config = self.config();
        let started = Instant::now();
        let mut report = TickReport::started(Utc::now());

        if let Err(err) = self.scan(&config, &mut report).await {
            let reason = format!("{:#}", err);
            error!(error = %reason, "Tick aborted");
            report.aborted = Some(reason);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.ticks_completed.fetch_add(1, Ordering::SeqCst);
        *self.last_tick.write() = Some(report.clone());

        info!(
            users = report.users,
            scanned = report.positions_scanned,
            skipped = report.skipped,
            safe = report.safe,
            liquidatable = report.liquidatable,
            liquidated = report.liquidated,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Tick finished"
        );
        report
    }

    async fn scan(&self, config: &LiquidationConfig, report: &mut TickReport) -> Result<()> {
        let assets = self.prices.list_assets().await.context("listing assets")?;
        let prices = PriceBook::from_assets(assets, Utc::now());
        debug!(assets = prices.len(), "Price book built");

        let users = self.users.list_users().await.context("listing users")?;
        report.users = users.len();

        let positions = &self.positions;
        let mut batches = stream::iter(users)
            .map(|user| async move {
                let result = positions
                    .list_positions_by_kind(user.id, PositionKind::Borrowing)
                    .await;
                (user.id, result)
            })
            .buffered(self.user_scan_concurrency);

        while let Some((user_id, result)) = batches.next().await {
            let user_positions = match result {
                Ok(user_positions) => user_positions,
                Err(err) if err.is_not_found() => {
                    warn!(user = user_id, error = %err, "User vanished during tick, skipping");
                    continue;
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("listing positions for user {}", user_id));
                }
            };

            for position in &user_positions {
                self.process(position, &prices, config, report).await;
            }
        }

        Ok(())
    }

    async fn process(
        &self,
        position: &Position,
        prices: &PriceBook,
        config: &LiquidationConfig,
        report: &mut TickReport,
    ) {
        report.positions_scanned += 1;

        let health = match evaluate(position, prices, config) {
            Evaluation::Skipped(reason) => {
                debug!(position = position.id, reason = %reason, "Skipping position");
                report.skipped += 1;
                return;
            }
            Evaluation::Evaluated(health) => health,
        };

        if !health.is_liquidatable() {
            report.safe += 1;
            return;
        }

        report.liquidatable += 1;
        warn!(
            position = position.id,
            user = position.user_id,
            hf = health.health_factor,
            "Position below health threshold"
        );

        match self
            .executor
            .execute(position, &health, config, TriggerSource::Scheduled)
            .await
        {
            Ok(event) if event.status == EventStatus::Completed => report.liquidated += 1,
            Ok(_) => report.failed += 1,
            Err(MonitorError::PositionNotFound(id)) => {
                debug!(position = id, "Position vanished before liquidation, skipping");
                report.skipped += 1;
            }
            Err(err) => {
                warn!(position = position.id, error = %err, "Liquidation not applied");
                report.failed += 1;
            }
        }
    }

    /// Check one position now, liquidating it if it is below threshold.
    ///
    /// Runs outside the tick cadence and does not wait for a running tick.
    #[instrument(skip(self))]
    pub async fn check_position(&self, id: PositionId) -> Result<TriggerResult, MonitorError> {
        let position = self
            .positions
            .get_position(id)
            .await
            .map_err(|err| MonitorError::from_position_lookup(id, err))?;

        let config = self.config();
        let prices = PriceBook::from_assets(self.prices.list_assets().await?, Utc::now());

        let outcome = match evaluate(&position, &prices, &config) {
            Evaluation::Skipped(skip) => TriggerOutcome::Skipped { skip },
            Evaluation::Evaluated(health) if !health.is_liquidatable() => {
                TriggerOutcome::Safe { health }
            }
            Evaluation::Evaluated(health) => {
                let event = self
                    .executor
                    .execute(&position, &health, &config, TriggerSource::Manual)
                    .await?;
                if event.status == EventStatus::Completed {
                    TriggerOutcome::Liquidated { event }
                } else {
                    TriggerOutcome::Failed { event }
                }
            }
        };

        let result = TriggerResult::new(id, outcome);
        info!(position = id, success = result.success, "{}", result.message);
        Ok(result)
    }
}
