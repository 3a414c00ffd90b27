//! Collaborator contracts consumed by the liquidation monitor.
//!
//! Each trait is one narrow capability so a deployment can back them with
//! different systems (a SQL store for positions, an oracle cache for prices).

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{
    Asset, NewTransaction, Position, PositionChanges, PositionId, PositionKind, Transaction, User,
    UserId,
};

/// Read/update access to positions.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// All positions of one kind owned by a user.
    async fn list_positions_by_kind(
        &self,
        user_id: UserId,
        kind: PositionKind,
    ) -> StoreResult<Vec<Position>>;

    /// Fetch a single position. Fails with `NotFound` for unknown ids.
    async fn get_position(&self, id: PositionId) -> StoreResult<Position>;

    /// Merge `changes` into a position and return the updated record.
    /// Fails with `NotFound` for unknown ids.
    async fn update_position(&self, id: PositionId, changes: PositionChanges)
        -> StoreResult<Position>;
}

/// Read-only price records.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Every known asset with its current price.
    async fn list_assets(&self) -> StoreResult<Vec<Asset>>;
}

/// Append-only audit sink.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn record_transaction(&self, tx: NewTransaction) -> StoreResult<Transaction>;
}

/// Enumerates the users whose positions are scanned.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<User>>;
}
