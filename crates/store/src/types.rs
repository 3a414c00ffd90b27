//! Record types held by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type AssetId = u64;
pub type PositionId = u64;
pub type TransactionId = u64;

/// A dashboard user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Asset price record owned by the price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Ticker symbol (e.g., "ETH")
    pub symbol: String,
    /// Current USD price, always > 0
    pub price: f64,
    /// When the price was last written
    pub updated_at: DateTime<Utc>,
}

/// Kind of exposure a position represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    Lending,
    Borrowing,
    Liquidity,
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lending => write!(f, "lending"),
            Self::Borrowing => write!(f, "borrowing"),
            Self::Liquidity => write!(f, "liquidity"),
        }
    }
}

/// One user's open exposure.
///
/// For borrowing positions the primary asset is the debt asset. Collateral is
/// optional; a position without it can never be liquidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub user_id: UserId,
    pub kind: PositionKind,
    /// Borrowed asset
    pub debt_asset_id: AssetId,
    /// Outstanding debt (asset units, >= 0)
    pub debt_amount: f64,
    /// Posted collateral asset
    pub collateral_asset_id: Option<AssetId>,
    /// Posted collateral (asset units, >= 0)
    pub collateral_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Zero-debt positions are inert.
    pub fn has_debt(&self) -> bool {
        self.debt_amount > 0.0
    }

    /// Collateral asset and amount, when both are present.
    pub fn collateral(&self) -> Option<(AssetId, f64)> {
        Some((self.collateral_asset_id?, self.collateral_amount?))
    }
}

/// Fields for opening a new position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub user_id: UserId,
    pub kind: PositionKind,
    pub debt_asset_id: AssetId,
    pub debt_amount: f64,
    #[serde(default)]
    pub collateral_asset_id: Option<AssetId>,
    #[serde(default)]
    pub collateral_amount: Option<f64>,
}

impl NewPosition {
    /// A borrowing position backed by collateral.
    pub fn borrowing(
        user_id: UserId,
        debt_asset_id: AssetId,
        debt_amount: f64,
        collateral_asset_id: AssetId,
        collateral_amount: f64,
    ) -> Self {
        Self {
            user_id,
            kind: PositionKind::Borrowing,
            debt_asset_id,
            debt_amount,
            collateral_asset_id: Some(collateral_asset_id),
            collateral_amount: Some(collateral_amount),
        }
    }
}

/// Partial update applied to a position. `None` fields are left as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionChanges {
    #[serde(default)]
    pub debt_amount: Option<f64>,
    #[serde(default)]
    pub collateral_amount: Option<f64>,
}

impl PositionChanges {
    pub fn amounts(debt_amount: f64, collateral_amount: f64) -> Self {
        Self {
            debt_amount: Some(debt_amount),
            collateral_amount: Some(collateral_amount),
        }
    }
}

/// Ledger transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Lend,
    Borrow,
    Repay,
    Withdraw,
    Swap,
    Liquidation,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lend => "lend",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::Withdraw => "withdraw",
            Self::Swap => "swap",
            Self::Liquidation => "liquidation",
        };
        f.write_str(s)
    }
}

/// Ledger transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Fields for recording a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub amount: f64,
    #[serde(default)]
    pub from_asset_id: Option<AssetId>,
    #[serde(default)]
    pub to_asset_id: Option<AssetId>,
    pub status: TransactionStatus,
}

/// Recorded ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub user_id: UserId,
    pub asset_id: AssetId,
    pub amount: f64,
    pub from_asset_id: Option<AssetId>,
    pub to_asset_id: Option<AssetId>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(collateral_asset_id: Option<AssetId>, collateral_amount: Option<f64>) -> Position {
        let now = Utc::now();
        Position {
            id: 1,
            user_id: 1,
            kind: PositionKind::Borrowing,
            debt_asset_id: 1,
            debt_amount: 100.0,
            collateral_asset_id,
            collateral_amount,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_collateral_requires_asset_and_amount() {
        assert_eq!(position(Some(2), Some(1.5)).collateral(), Some((2, 1.5)));
        assert_eq!(position(None, Some(1.5)).collateral(), None);
        assert_eq!(position(Some(2), None).collateral(), None);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&PositionKind::Borrowing).unwrap();
        assert_eq!(json, "\"borrowing\"");
        assert_eq!(PositionKind::Liquidity.to_string(), "liquidity");
        assert_eq!(TransactionKind::Liquidation.to_string(), "liquidation");
    }
}
