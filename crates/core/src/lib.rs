//! Liquidation monitor core logic.
//!
//! This crate provides the liquidation monitor functionality:
//! - Runtime configuration with profiles and validated partial updates
//! - Per-tick price book keyed by asset id
//! - Pure health factor evaluation
//! - Partial liquidation execution with an in-flight guard per position
//! - Liquidation event log and engine statistics
//! - Interval scheduler with start/stop control
//!
//! Positions, prices, users and the audit ledger are reached through the
//! contracts in `monitor-store`.

pub mod config;
mod engine;
mod error;
mod events;
mod executor;
mod health;
mod prices;
mod scheduler;
mod stats;

pub use config::{
    load_config, ConfigUpdate, DemoConfig, LiquidationConfig, MonitorConfig, SchedulerConfig,
    ServerConfig,
};
pub use engine::{Collaborators, LiquidationEngine, TriggerOutcome, TriggerResult};
pub use error::MonitorError;
pub use events::{
    EventDraft, EventId, EventLog, EventStatus, EventSummary, LiquidationEvent, TriggerSource,
    DEFAULT_EVENT_LIMIT,
};
pub use executor::{LiquidationExecutor, LiquidationPlan, CLOSE_FACTOR, LIQUIDATOR_REWARD_SHARE};
pub use health::{evaluate, Classification, Evaluation, HealthReport, SkipReason};
pub use prices::{PriceBook, Quote};
pub use scheduler::Scheduler;
pub use stats::{EngineStats, TickReport};
