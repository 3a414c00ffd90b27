//! Engine statistics snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LiquidationConfig;
use crate::events::EventSummary;

/// Counters for one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub users: usize,
    pub positions_scanned: usize,
    pub skipped: usize,
    pub safe: usize,
    pub liquidatable: usize,
    /// Completed liquidations
    pub liquidated: usize,
    /// Failed liquidations plus liquidations refused by the executor
    pub failed: usize,
    /// Why the tick stopped early, if it did
    pub aborted: Option<String>,
}

impl TickReport {
    pub fn started(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ..Default::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Read-only view of the engine for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub running: bool,
    pub config: LiquidationConfig,
    pub ticks_completed: u64,
    pub last_tick: Option<TickReport>,
    #[serde(flatten)]
    pub events: EventSummary,
}
