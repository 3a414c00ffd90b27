//! Liquidation event log.
//!
//! Events are created `pending` when a liquidation is decided and move to a
//! terminal state exactly once. Readers get whole clones taken under a read
//! lock, so a snapshot never shows a half-written event.

use chrono::{DateTime, Utc};
use monitor_store::{AssetId, PositionId, TransactionId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub type EventId = u64;

/// Default number of events returned by `recent`.
pub const DEFAULT_EVENT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// What caused a liquidation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Scheduled,
    Manual,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Record of one liquidation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub id: EventId,
    pub position_id: PositionId,
    pub user_id: UserId,
    pub debt_asset_id: AssetId,
    pub collateral_asset_id: AssetId,
    /// Health factor at decision time
    pub health_factor: f64,
    /// Debt repaid (debt asset units)
    pub liquidated_debt: f64,
    /// Base seizure plus penalty (collateral asset units)
    pub collateral_seized: f64,
    pub penalty: f64,
    /// Half of the penalty; recorded, not disbursed
    pub liquidator_reward: f64,
    pub status: EventStatus,
    pub source: TriggerSource,
    pub failure_reason: Option<String>,
    /// Audit transaction written for a completed event
    pub transaction_id: Option<TransactionId>,
    pub timestamp: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

/// Fields known when a liquidation is decided.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub position_id: PositionId,
    pub user_id: UserId,
    pub debt_asset_id: AssetId,
    pub collateral_asset_id: AssetId,
    pub health_factor: f64,
    pub liquidated_debt: f64,
    pub collateral_seized: f64,
    pub penalty: f64,
    pub liquidator_reward: f64,
    pub source: TriggerSource,
}

/// Aggregates over the event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub pending: u64,
    pub completed: u64,
    pub failed: u64,
    /// Sums below cover completed events only
    pub total_debt_liquidated: f64,
    pub total_collateral_seized: f64,
    pub total_penalties: f64,
    pub total_rewards: f64,
}

impl EventSummary {
    pub fn total(&self) -> u64 {
        self.pending + self.completed + self.failed
    }
}

/// Append-only store of liquidation events, keyed by monotonic id.
pub struct EventLog {
    events: RwLock<BTreeMap<EventId, LiquidationEvent>>,
    next_id: AtomicU64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a pending event.
    pub fn open(&self, draft: EventDraft) -> LiquidationEvent {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = LiquidationEvent {
            id,
            position_id: draft.position_id,
            user_id: draft.user_id,
            debt_asset_id: draft.debt_asset_id,
            collateral_asset_id: draft.collateral_asset_id,
            health_factor: draft.health_factor,
            liquidated_debt: draft.liquidated_debt,
            collateral_seized: draft.collateral_seized,
            penalty: draft.penalty,
            liquidator_reward: draft.liquidator_reward,
            status: EventStatus::Pending,
            source: draft.source,
            failure_reason: None,
            transaction_id: None,
            timestamp: Utc::now(),
            finalized_at: None,
        };

        self.events.write().insert(id, event.clone());
        event
    }

    /// Mark a pending event completed.
    pub fn complete(&self, id: EventId, transaction_id: TransactionId) -> Option<LiquidationEvent> {
        self.finalize(id, |event| {
            event.status = EventStatus::Completed;
            event.transaction_id = Some(transaction_id);
        })
    }

    /// Mark a pending event failed.
    pub fn fail(&self, id: EventId, reason: impl Into<String>) -> Option<LiquidationEvent> {
        let reason = reason.into();
        self.finalize(id, move |event| {
            event.status = EventStatus::Failed;
            event.failure_reason = Some(reason);
        })
    }

    fn finalize(
        &self,
        id: EventId,
        apply: impl FnOnce(&mut LiquidationEvent),
    ) -> Option<LiquidationEvent> {
        let mut events = self.events.write();
        let event = events.get_mut(&id)?;

        if event.status.is_terminal() {
            warn!(event = id, status = ?event.status, "Event already finalized");
            return Some(event.clone());
        }

        apply(event);
        event.finalized_at = Some(Utc::now());
        Some(event.clone())
    }

    /// Up to `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LiquidationEvent> {
        self.events
            .read()
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: EventId) -> Option<LiquidationEvent> {
        self.events.read().get(&id).cloned()
    }

    /// Counts by status and value sums over completed events.
    pub fn summary(&self) -> EventSummary {
        let events = self.events.read();
        let mut summary = EventSummary::default();

        for event in events.values() {
            match event.status {
                EventStatus::Pending => summary.pending += 1,
                EventStatus::Failed => summary.failed += 1,
                EventStatus::Completed => {
                    summary.completed += 1;
                    summary.total_debt_liquidated += event.liquidated_debt;
                    summary.total_collateral_seized += event.collateral_seized;
                    summary.total_penalties += event.penalty;
                    summary.total_rewards += event.liquidator_reward;
                }
            }
        }

        summary
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(position_id: PositionId, debt: f64) -> EventDraft {
        EventDraft {
            position_id,
            user_id: 1,
            debt_asset_id: 1,
            collateral_asset_id: 2,
            health_factor: 0.8,
            liquidated_debt: debt,
            collateral_seized: 0.55,
            penalty: 0.05,
            liquidator_reward: 0.025,
            source: TriggerSource::Scheduled,
        }
    }

    #[test]
    fn test_lifecycle() {
        let log = EventLog::new();
        let event = log.open(draft(1, 100.0));
        assert_eq!(event.id, 1);
        assert_eq!(event.status, EventStatus::Pending);

        let done = log.complete(event.id, 42).unwrap();
        assert_eq!(done.status, EventStatus::Completed);
        assert_eq!(done.transaction_id, Some(42));
        assert!(done.finalized_at.is_some());
    }

    #[test]
    fn test_terminal_state_is_final() {
        let log = EventLog::new();
        let event = log.open(draft(1, 100.0));
        log.fail(event.id, "store unavailable");

        let after = log.complete(event.id, 7).unwrap();
        assert_eq!(after.status, EventStatus::Failed);
        assert_eq!(after.transaction_id, None);
        assert_eq!(after.failure_reason.as_deref(), Some("store unavailable"));

        assert!(log.complete(99, 1).is_none());
    }

    #[test]
    fn test_recent_newest_first() {
        let log = EventLog::new();
        for position in 1..=5 {
            log.open(draft(position, 10.0));
        }

        let recent = log.recent(3);
        let ids: Vec<_> = recent.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
        assert_eq!(log.recent(100).len(), 5);
        assert_eq!(log.get(2).unwrap().position_id, 2);
    }

    #[test]
    fn test_summary_sums_completed_only() {
        let log = EventLog::new();
        let a = log.open(draft(1, 100.0));
        let b = log.open(draft(2, 200.0));
        log.open(draft(3, 300.0));
        log.complete(a.id, 1);
        log.fail(b.id, "boom");

        let summary = log.summary();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.total_debt_liquidated, 100.0);
        assert!((summary.total_rewards - 0.025).abs() < 1e-12);
    }
}
