//! Partial updates to the runtime liquidation parameters.

use serde::{Deserialize, Serialize};

use super::LiquidationConfig;
use crate::error::MonitorError;

/// Liquidation parameter overrides. `None` fields keep their current value.
///
/// Field names are accepted in snake_case or in the dashboard's camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, alias = "liquidationThreshold")]
    pub liquidation_threshold: Option<f64>,
    #[serde(default, alias = "liquidationPenalty")]
    pub liquidation_penalty: Option<f64>,
    #[serde(default, alias = "healthFactorThreshold")]
    pub health_factor_threshold: Option<f64>,
    /// `0` turns the staleness check off.
    #[serde(default, alias = "maxPriceAgeSecs")]
    pub max_price_age_secs: Option<u64>,
}

impl ConfigUpdate {
    /// Merge the overrides onto `base` and validate the result.
    ///
    /// `base` is never modified; on error the caller keeps its current config.
    pub fn apply(&self, base: &LiquidationConfig) -> Result<LiquidationConfig, MonitorError> {
        let mut config = base.clone();

        if let Some(v) = self.liquidation_threshold {
            config.liquidation_threshold = v;
        }
        if let Some(v) = self.liquidation_penalty {
            config.liquidation_penalty = v;
        }
        if let Some(v) = self.health_factor_threshold {
            config.health_factor_threshold = v;
        }
        if let Some(v) = self.max_price_age_secs {
            config.max_price_age_secs = (v > 0).then_some(v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_changes_only_given_fields() {
        let base = LiquidationConfig::default();
        let update = ConfigUpdate {
            liquidation_penalty: Some(0.15),
            ..Default::default()
        };

        let merged = update.apply(&base).unwrap();
        assert_eq!(merged.liquidation_penalty, 0.15);
        assert_eq!(merged.liquidation_threshold, base.liquidation_threshold);
        assert_eq!(merged.health_factor_threshold, base.health_factor_threshold);
        assert_eq!(merged.max_price_age_secs, base.max_price_age_secs);
    }

    #[test]
    fn test_out_of_domain_rejected() {
        let base = LiquidationConfig::default();
        let update = ConfigUpdate {
            liquidation_penalty: Some(0.15),
            liquidation_threshold: Some(3.5),
            ..Default::default()
        };

        let err = update.apply(&base).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::InvalidConfig { field: "liquidation_threshold", .. }
        ));
    }

    #[test]
    fn test_camel_case_body() {
        let update: ConfigUpdate =
            serde_json::from_str(r#"{"liquidationPenalty": 0.12, "healthFactorThreshold": 1.1}"#)
                .unwrap();
        assert_eq!(update.liquidation_penalty, Some(0.12));
        assert_eq!(update.health_factor_threshold, Some(1.1));
        assert_eq!(update.liquidation_threshold, None);
    }

    #[test]
    fn test_price_age_toggle() {
        let base = LiquidationConfig::default();
        let on = ConfigUpdate {
            max_price_age_secs: Some(60),
            ..Default::default()
        }
        .apply(&base)
        .unwrap();
        assert_eq!(on.max_price_age_secs, Some(60));

        let off = ConfigUpdate {
            max_price_age_secs: Some(0),
            ..Default::default()
        }
        .apply(&on)
        .unwrap();
        assert_eq!(off.max_price_age_secs, None);
        assert!(ConfigUpdate::default().is_empty());
    }
}
