//! Liquidation scheduler.
//!
//! Two states, stopped and running. While running, a background task calls
//! `LiquidationEngine::run_tick` on a fixed interval, starting immediately.
//! Stopping cancels the loop between ticks; a tick in progress finishes.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::LiquidationEngine;
use crate::stats::EngineStats;

#[derive(Default)]
struct SchedulerState {
    /// Present while running
    cancel: Option<CancellationToken>,
    /// Loop tasks not yet known to have exited
    tasks: Vec<JoinHandle<()>>,
}

/// Drives periodic ticks of a shared engine.
pub struct Scheduler {
    engine: Arc<LiquidationEngine>,
    tick_interval: Duration,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    /// Create a stopped scheduler.
    pub fn new(engine: Arc<LiquidationEngine>, tick_interval: Duration) -> Self {
        Self {
            engine,
            tick_interval,
            state: Mutex::new(SchedulerState::default()),
        }
    }

    pub fn engine(&self) -> &Arc<LiquidationEngine> {
        &self.engine
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().cancel.is_some()
    }

    /// Transition to running. Returns false if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.cancel.is_some() {
            info!("Scheduler already running");
            return false;
        }

        state.tasks.retain(|task| !task.is_finished());

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            self.engine.clone(),
            self.tick_interval,
            cancel.clone(),
        ));
        state.cancel = Some(cancel);
        state.tasks.push(task);

        info!(interval_secs = self.tick_interval.as_secs_f64(), "Scheduler started");
        true
    }

    /// Transition to stopped. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        match state.cancel.take() {
            Some(cancel) => {
                cancel.cancel();
                info!("Scheduler stopped");
                true
            }
            None => {
                info!("Scheduler already stopped");
                false
            }
        }
    }

    /// Stop and wait for the loop to exit, including any tick in progress.
    pub async fn shutdown(&self) {
        self.stop();
        let tasks = std::mem::take(&mut self.state.lock().tasks);

        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Scheduler task ended abnormally");
            }
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats(self.is_running())
    }
}

async fn run_loop(engine: Arc<LiquidationEngine>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        engine.run_tick().await;
    }

    debug!("Scheduler loop exited");
}
