//! Configuration for the liquidation monitor.
//!
//! This module provides:
//! - Monitor configuration (profiles, scheduler timing, server, demo seeding)
//! - Liquidation parameters and their domains
//! - Partial runtime updates with merge semantics
//! - Loading from TOML files, profiles and environment overrides

mod loader;
mod monitor;
mod update;

pub use loader::{apply_env_overrides, env, load_config, load_config_with};
pub use monitor::{
    DemoConfig, LiquidationConfig, MonitorConfig, SchedulerConfig, ServerConfig,
};
pub use update::ConfigUpdate;
