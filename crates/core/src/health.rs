//! Health factor evaluation.
//!
//! `evaluate` is pure: it reads one position, the tick's price book and the
//! tick's configuration snapshot, and returns either a classification or the
//! reason the position could not be evaluated.

use monitor_store::{AssetId, Position, PositionId, PositionKind};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LiquidationConfig;
use crate::prices::PriceBook;

/// Risk classification of an evaluable position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Safe,
    Liquidatable,
}

/// Why a position was excluded from classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "asset_id", rename_all = "snake_case")]
pub enum SkipReason {
    /// Only borrowing positions carry liquidatable debt
    NotBorrowing,
    ZeroDebt,
    /// Collateral asset or amount absent
    MissingCollateral,
    MissingPrice(AssetId),
    StalePrice(AssetId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBorrowing => write!(f, "not a borrowing position"),
            Self::ZeroDebt => write!(f, "zero debt"),
            Self::MissingCollateral => write!(f, "missing collateral"),
            Self::MissingPrice(id) => write!(f, "no price for asset {}", id),
            Self::StalePrice(id) => write!(f, "stale price for asset {}", id),
        }
    }
}

/// Computed health of one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub position_id: PositionId,
    pub debt_price: f64,
    pub collateral_price: f64,
    pub debt_value: f64,
    pub collateral_value: f64,
    /// collateral_value / debt_value
    pub collateral_ratio: f64,
    /// collateral_ratio / liquidation_threshold
    pub health_factor: f64,
    pub classification: Classification,
}

impl HealthReport {
    pub fn is_liquidatable(&self) -> bool {
        self.classification == Classification::Liquidatable
    }
}

/// Outcome of evaluating one position.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Skipped(SkipReason),
    Evaluated(HealthReport),
}

/// Compute the health of `position` against `prices` and `config`.
pub fn evaluate(position: &Position, prices: &PriceBook, config: &LiquidationConfig) -> Evaluation {
    match compute(position, prices, config) {
        Ok(report) => Evaluation::Evaluated(report),
        Err(reason) => Evaluation::Skipped(reason),
    }
}

fn compute(
    position: &Position,
    prices: &PriceBook,
    config: &LiquidationConfig,
) -> Result<HealthReport, SkipReason> {
    if position.kind != PositionKind::Borrowing {
        return Err(SkipReason::NotBorrowing);
    }
    if !position.has_debt() {
        return Err(SkipReason::ZeroDebt);
    }
    let (collateral_asset, collateral_amount) =
        position.collateral().ok_or(SkipReason::MissingCollateral)?;

    let debt_price = prices.price(position.debt_asset_id, config.max_price_age_secs)?;
    let collateral_price = prices.price(collateral_asset, config.max_price_age_secs)?;

    let debt_value = position.debt_amount * debt_price;
    let collateral_value = collateral_amount * collateral_price;
    if debt_value <= 0.0 {
        return Err(SkipReason::ZeroDebt);
    }

    let collateral_ratio = collateral_value / debt_value;
    let health_factor = collateral_ratio / config.liquidation_threshold;

    let classification = if health_factor >= config.health_factor_threshold {
        Classification::Safe
    } else {
        Classification::Liquidatable
    };

    Ok(HealthReport {
        position_id: position.id,
        debt_price,
        collateral_price,
        debt_value,
        collateral_value,
        collateral_ratio,
        health_factor,
        classification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use monitor_store::Asset;

    const USDC: AssetId = 1;
    const ETH: AssetId = 2;
    const BTC: AssetId = 3;

    fn book() -> PriceBook {
        let now = Utc::now();
        let assets = [(USDC, "USDC", 1.0), (ETH, "ETH", 2000.0), (BTC, "BTC", 40000.0)]
            .into_iter()
            .map(|(id, symbol, price)| Asset {
                id,
                symbol: symbol.to_string(),
                price,
                updated_at: now,
            });
        PriceBook::from_assets(assets, now)
    }

    fn borrow(debt: f64, collateral_asset: AssetId, collateral: f64) -> Position {
        let now = Utc::now();
        Position {
            id: 1,
            user_id: 1,
            kind: PositionKind::Borrowing,
            debt_asset_id: USDC,
            debt_amount: debt,
            collateral_asset_id: Some(collateral_asset),
            collateral_amount: Some(collateral),
            created_at: now,
            updated_at: now,
        }
    }

    fn report(evaluation: Evaluation) -> HealthReport {
        match evaluation {
            Evaluation::Evaluated(report) => report,
            Evaluation::Skipped(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_scenario_a_safe() {
        let r = report(evaluate(&borrow(1000.0, ETH, 1.0), &book(), &LiquidationConfig::default()));
        assert!((r.collateral_ratio - 2.0).abs() < 1e-9);
        assert!((r.health_factor - 1.3333).abs() < 1e-3);
        assert_eq!(r.classification, Classification::Safe);
    }

    #[test]
    fn test_scenario_b_liquidatable() {
        let r = report(evaluate(&borrow(1500.0, BTC, 0.04), &book(), &LiquidationConfig::default()));
        assert!((r.collateral_ratio - 1.0667).abs() < 1e-3);
        assert!((r.health_factor - 0.7111).abs() < 1e-3);
        assert!(r.is_liquidatable());
    }

    #[test]
    fn test_scenario_c_liquidatable() {
        let r = report(evaluate(&borrow(2000.0, ETH, 1.2), &book(), &LiquidationConfig::default()));
        assert!((r.collateral_ratio - 1.2).abs() < 1e-9);
        assert!((r.health_factor - 0.8).abs() < 1e-9);
        assert!(r.is_liquidatable());
    }

    #[test]
    fn test_threshold_boundary_is_safe() {
        // ratio 1.5 / threshold 1.5 = HF exactly 1.0
        let r = report(evaluate(&borrow(1000.0, ETH, 0.75), &book(), &LiquidationConfig::default()));
        assert_eq!(r.health_factor, 1.0);
        assert_eq!(r.classification, Classification::Safe);
    }

    #[test]
    fn test_config_changes_classification() {
        let config = LiquidationConfig {
            health_factor_threshold: 1.5,
            ..Default::default()
        };
        let r = report(evaluate(&borrow(1000.0, ETH, 1.0), &book(), &config));
        assert!(r.is_liquidatable());
    }

    #[test]
    fn test_skips() {
        let config = LiquidationConfig::default();
        let prices = book();

        let zero = borrow(0.0, ETH, 1.0);
        assert_eq!(evaluate(&zero, &prices, &config), Evaluation::Skipped(SkipReason::ZeroDebt));

        let mut no_asset = borrow(100.0, ETH, 1.0);
        no_asset.collateral_asset_id = None;
        assert_eq!(
            evaluate(&no_asset, &prices, &config),
            Evaluation::Skipped(SkipReason::MissingCollateral)
        );

        let mut no_amount = borrow(100.0, ETH, 1.0);
        no_amount.collateral_amount = None;
        assert_eq!(
            evaluate(&no_amount, &prices, &config),
            Evaluation::Skipped(SkipReason::MissingCollateral)
        );

        let unpriced = borrow(100.0, 99, 1.0);
        assert_eq!(
            evaluate(&unpriced, &prices, &config),
            Evaluation::Skipped(SkipReason::MissingPrice(99))
        );

        let mut lending = borrow(100.0, ETH, 1.0);
        lending.kind = PositionKind::Lending;
        assert_eq!(
            evaluate(&lending, &prices, &config),
            Evaluation::Skipped(SkipReason::NotBorrowing)
        );
    }

    #[test]
    fn test_skip_reason_serialization() {
        let json = serde_json::to_value(SkipReason::StalePrice(4)).unwrap();
        assert_eq!(json, serde_json::json!({"reason": "stale_price", "asset_id": 4}));

        let json = serde_json::to_value(SkipReason::ZeroDebt).unwrap();
        assert_eq!(json, serde_json::json!({"reason": "zero_debt"}));
    }
}
