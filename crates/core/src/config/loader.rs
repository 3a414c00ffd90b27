//! Configuration loading from profiles, TOML files and environment overrides.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::MonitorConfig;

/// Environment variable names.
pub mod env {
    /// Path to a TOML config file (takes precedence over the profile)
    pub const CONFIG_PATH: &str = "MONITOR_CONFIG";
    /// Profile name: default, testing, production
    pub const PROFILE: &str = "MONITOR_PROFILE";
    pub const BIND_ADDR: &str = "MONITOR_BIND_ADDR";
    pub const TICK_INTERVAL_SECS: &str = "MONITOR_TICK_INTERVAL_SECS";
    pub const AUTOSTART: &str = "MONITOR_AUTOSTART";
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<MonitorConfig> {
    load_config_with(|name| std::env::var(name).ok())
}

/// Load configuration using `lookup` to read variables.
pub fn load_config_with(lookup: impl Fn(&str) -> Option<String>) -> Result<MonitorConfig> {
    let mut config = match lookup(env::CONFIG_PATH) {
        Some(path) => {
            info!(path = %path, "Loading configuration file");
            MonitorConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path))?
        }
        None => {
            let profile = lookup(env::PROFILE).unwrap_or_else(|| "default".to_string());
            MonitorConfig::load_profile(&profile).unwrap_or_else(|| {
                warn!(profile = %profile, "Unknown profile, using default");
                MonitorConfig::default()
            })
        }
    };

    apply_env_overrides(&mut config, &lookup)?;
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// Apply individual environment overrides on top of a loaded config.
pub fn apply_env_overrides(
    config: &mut MonitorConfig,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(addr) = lookup(env::BIND_ADDR) {
        config.server.bind_addr = addr;
    }

    if let Some(secs) = lookup(env::TICK_INTERVAL_SECS) {
        config.scheduler.tick_interval_secs = secs
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", env::TICK_INTERVAL_SECS, secs))?;
    }

    if let Some(flag) = lookup(env::AUTOSTART) {
        config.scheduler.autostart = match flag.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => anyhow::bail!("Invalid {}: {}", env::AUTOSTART, other),
        };
    }

    Ok(())
}
