//! Monitor configuration with profile support.
//!
//! Provides the process configuration (scheduler timing, server binding,
//! demo seeding) together with the initial liquidation parameters. Profiles
//! cover testing, default and production setups.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::MonitorError;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    /// Tick timing and scan behaviour
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Initial liquidation parameters (mutable at runtime)
    #[serde(default)]
    pub liquidation: LiquidationConfig,

    /// Operator HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Demo data seeding
    #[serde(default)]
    pub demo: DemoConfig,
}

fn default_profile_name() -> String {
    "default".to_string()
}

/// Scheduler timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between ticks (seconds)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Start the scheduler on boot
    #[serde(default = "default_autostart")]
    pub autostart: bool,

    /// Concurrent per-user position reads during a tick
    #[serde(default = "default_user_scan_concurrency")]
    pub user_scan_concurrency: usize,
}

fn default_tick_interval() -> u64 {
    30
}
fn default_autostart() -> bool {
    true
}
fn default_user_scan_concurrency() -> usize {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            autostart: default_autostart(),
            user_scan_concurrency: default_user_scan_concurrency(),
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

/// Liquidation parameters.
///
/// This is the part of the configuration operators can change at runtime;
/// each tick works from a snapshot taken when it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationConfig {
    /// Required collateral ratio (1.5 = 150%), domain (1.0, 3.0]
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: f64,

    /// Penalty fraction of seized collateral, domain [0.05, 0.2]
    #[serde(default = "default_liquidation_penalty")]
    pub liquidation_penalty: f64,

    /// Health factor below which a position is liquidatable, domain [0.5, 2.0]
    #[serde(default = "default_health_factor_threshold")]
    pub health_factor_threshold: f64,

    /// Skip positions priced from records older than this (seconds).
    /// `None` trusts whatever the price source returns.
    #[serde(default)]
    pub max_price_age_secs: Option<u64>,
}

fn default_liquidation_threshold() -> f64 {
    1.5
}
fn default_liquidation_penalty() -> f64 {
    0.1
}
fn default_health_factor_threshold() -> f64 {
    1.0
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            liquidation_threshold: default_liquidation_threshold(),
            liquidation_penalty: default_liquidation_penalty(),
            health_factor_threshold: default_health_factor_threshold(),
            max_price_age_secs: None,
        }
    }
}

impl LiquidationConfig {
    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), MonitorError> {
        check_range(
            "liquidation_threshold",
            self.liquidation_threshold,
            |v| v > 1.0 && v <= 3.0,
            "must be in (1.0, 3.0]",
        )?;
        check_range(
            "liquidation_penalty",
            self.liquidation_penalty,
            |v| (0.05..=0.2).contains(&v),
            "must be in [0.05, 0.2]",
        )?;
        check_range(
            "health_factor_threshold",
            self.health_factor_threshold,
            |v| (0.5..=2.0).contains(&v),
            "must be in [0.5, 2.0]",
        )?;
        if self.max_price_age_secs == Some(0) {
            return Err(MonitorError::InvalidConfig {
                field: "max_price_age_secs",
                value: 0.0,
                reason: "must be positive when set",
            });
        }
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    in_domain: impl Fn(f64) -> bool,
    reason: &'static str,
) -> Result<(), MonitorError> {
    if value.is_finite() && in_domain(value) {
        Ok(())
    } else {
        Err(MonitorError::InvalidConfig { field, value, reason })
    }
}

/// Operator HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Demo data seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed demo users, assets and positions on boot
    #[serde(default = "default_seed")]
    pub seed: bool,
}

fn default_seed() -> bool {
    true
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { seed: default_seed() }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            scheduler: SchedulerConfig::default(),
            liquidation: LiquidationConfig::default(),
            server: ServerConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Fast ticks and demo data, for local runs.
    pub fn testing() -> Self {
        Self {
            profile: "testing".to_string(),
            scheduler: SchedulerConfig {
                tick_interval_secs: 5,
                autostart: true,
                user_scan_concurrency: 4,
            },
            liquidation: LiquidationConfig::default(),
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
            },
            demo: DemoConfig { seed: true },
        }
    }

    /// Reference timing, no demo data, stale prices rejected.
    pub fn production() -> Self {
        Self {
            profile: "production".to_string(),
            scheduler: SchedulerConfig {
                tick_interval_secs: 30,
                autostart: true,
                user_scan_concurrency: 16,
            },
            liquidation: LiquidationConfig {
                max_price_age_secs: Some(300),
                ..Default::default()
            },
            server: ServerConfig::default(),
            demo: DemoConfig { seed: false },
        }
    }

    /// Resolve a profile by name.
    pub fn load_profile(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "testing" | "test" => Some(Self::testing()),
            "production" | "prod" => Some(Self::production()),
            _ => None,
        }
    }

    /// Check the whole configuration before use.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.liquidation.validate()?;
        if self.scheduler.tick_interval_secs == 0 {
            anyhow::bail!("scheduler.tick_interval_secs must be positive");
        }
        if self.scheduler.user_scan_concurrency == 0 {
            anyhow::bail!("scheduler.user_scan_concurrency must be positive");
        }
        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(profile = %self.profile, "Monitor configuration loaded");
        tracing::info!(
            tick_interval_secs = self.scheduler.tick_interval_secs,
            autostart = self.scheduler.autostart,
            user_scan_concurrency = self.scheduler.user_scan_concurrency,
            "Scheduler timing"
        );
        tracing::info!(
            liquidation_threshold = self.liquidation.liquidation_threshold,
            liquidation_penalty = self.liquidation.liquidation_penalty,
            health_factor_threshold = self.liquidation.health_factor_threshold,
            max_price_age_secs = ?self.liquidation.max_price_age_secs,
            "Liquidation parameters"
        );
        tracing::info!(
            bind_addr = %self.server.bind_addr,
            seed_demo = self.demo.seed,
            "Server"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.scheduler.tick_interval_secs, 30);
        assert_eq!(config.liquidation.liquidation_threshold, 1.5);
        assert_eq!(config.liquidation.liquidation_penalty, 0.1);
        assert_eq!(config.liquidation.health_factor_threshold, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profiles() {
        assert_eq!(MonitorConfig::testing().scheduler.tick_interval_secs, 5);
        assert!(!MonitorConfig::production().demo.seed);
        assert_eq!(MonitorConfig::load_profile("PROD").unwrap().profile, "production");
        assert!(MonitorConfig::load_profile("aggressive").is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: MonitorConfig = toml::from_str(
            r#"
            profile = "custom"

            [liquidation]
            liquidation_penalty = 0.15
            "#,
        )
        .unwrap();
        assert_eq!(parsed.profile, "custom");
        assert_eq!(parsed.liquidation.liquidation_penalty, 0.15);
        assert_eq!(parsed.liquidation.liquidation_threshold, 1.5);
        assert_eq!(parsed.scheduler, SchedulerConfig::default());
    }

    #[test]
    fn test_serialization() {
        let config = MonitorConfig::production();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("profile = \"production\""));

        let parsed: MonitorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_liquidation_domains() {
        let valid = LiquidationConfig::default();

        let bad = LiquidationConfig { liquidation_threshold: 1.0, ..valid.clone() };
        assert!(bad.validate().is_err());
        let ok = LiquidationConfig { liquidation_threshold: 3.0, ..valid.clone() };
        assert!(ok.validate().is_ok());

        let bad = LiquidationConfig { liquidation_penalty: 0.25, ..valid.clone() };
        assert!(bad.validate().is_err());
        let bad = LiquidationConfig { health_factor_threshold: f64::NAN, ..valid.clone() };
        assert!(bad.validate().is_err());
        let bad = LiquidationConfig { max_price_age_secs: Some(0), ..valid };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = MonitorConfig::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
