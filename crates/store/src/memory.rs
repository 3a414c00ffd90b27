//! In-memory record store implementing every collaborator contract.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::contracts::{PositionStore, PriceSource, TransactionLedger, UserDirectory};
use crate::error::{StoreError, StoreResult};
use crate::types::{
    Asset, AssetId, NewPosition, NewTransaction, Position, PositionChanges, PositionId,
    PositionKind, Transaction, User, UserId,
};

/// Concurrent in-memory store.
///
/// Ids are assigned from monotonic counters starting at 1. Writes reject
/// negative or non-finite amounts and non-positive prices so that nothing
/// invalid reaches the health evaluator.
pub struct InMemoryStore {
    users: DashMap<UserId, User>,
    assets: DashMap<AssetId, Asset>,
    positions: DashMap<PositionId, Position>,
    transactions: RwLock<Vec<Transaction>>,

    next_user_id: AtomicU64,
    next_asset_id: AtomicU64,
    next_position_id: AtomicU64,
    next_transaction_id: AtomicU64,

    /// Fault injection: fail every position write
    fail_position_writes: AtomicBool,
    /// Fault injection: fail every ledger write
    fail_ledger_writes: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            assets: DashMap::new(),
            positions: DashMap::new(),
            transactions: RwLock::new(Vec::new()),
            next_user_id: AtomicU64::new(1),
            next_asset_id: AtomicU64::new(1),
            next_position_id: AtomicU64::new(1),
            next_transaction_id: AtomicU64::new(1),
            fail_position_writes: AtomicBool::new(false),
            fail_ledger_writes: AtomicBool::new(false),
        }
    }

    /// Register a user.
    pub fn add_user(&self, username: impl Into<String>) -> User {
        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            username: username.into(),
        };
        self.users.insert(id, user.clone());
        user
    }

    /// Register an asset with its initial price.
    pub fn add_asset(&self, symbol: impl Into<String>, price: f64) -> StoreResult<Asset> {
        validate_price(price)?;
        let id = self.next_asset_id.fetch_add(1, Ordering::Relaxed);
        let asset = Asset {
            id,
            symbol: symbol.into(),
            price,
            updated_at: Utc::now(),
        };
        self.assets.insert(id, asset.clone());
        Ok(asset)
    }

    /// Overwrite an asset's price.
    pub fn set_price(&self, asset_id: AssetId, price: f64) -> StoreResult<Asset> {
        validate_price(price)?;
        let mut asset = self
            .assets
            .get_mut(&asset_id)
            .ok_or(StoreError::NotFound { entity: "asset", id: asset_id })?;
        asset.price = price;
        asset.updated_at = Utc::now();
        debug!(asset = %asset.symbol, price, "Price updated");
        Ok(asset.clone())
    }

    /// Overwrite an asset record as is (used to backdate `updated_at`).
    pub fn put_asset(&self, asset: Asset) -> StoreResult<()> {
        validate_price(asset.price)?;
        self.next_asset_id.fetch_max(asset.id + 1, Ordering::Relaxed);
        self.assets.insert(asset.id, asset);
        Ok(())
    }

    /// Open a new position.
    pub fn open_position(&self, new: NewPosition) -> StoreResult<Position> {
        validate_amount("debt_amount", new.debt_amount)?;
        if let Some(amount) = new.collateral_amount {
            validate_amount("collateral_amount", amount)?;
        }
        if !self.users.contains_key(&new.user_id) {
            return Err(StoreError::NotFound { entity: "user", id: new.user_id });
        }

        let id = self.next_position_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let position = Position {
            id,
            user_id: new.user_id,
            kind: new.kind,
            debt_asset_id: new.debt_asset_id,
            debt_amount: new.debt_amount,
            collateral_asset_id: new.collateral_asset_id,
            collateral_amount: new.collateral_amount,
            created_at: now,
            updated_at: now,
        };
        self.positions.insert(id, position.clone());
        Ok(position)
    }

    /// Snapshot of the ledger, oldest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().clone()
    }

    /// Make every subsequent position write fail (or succeed again).
    pub fn set_fail_position_writes(&self, fail: bool) {
        self.fail_position_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent ledger write fail (or succeed again).
    pub fn set_fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionStore for InMemoryStore {
    async fn list_positions_by_kind(
        &self,
        user_id: UserId,
        kind: PositionKind,
    ) -> StoreResult<Vec<Position>> {
        let mut positions: Vec<Position> = self
            .positions
            .iter()
            .filter(|p| p.user_id == user_id && p.kind == kind)
            .map(|p| p.value().clone())
            .collect();
        positions.sort_by_key(|p| p.id);
        Ok(positions)
    }

    async fn get_position(&self, id: PositionId) -> StoreResult<Position> {
        self.positions
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or_else(|| StoreError::position_not_found(id))
    }

    async fn update_position(
        &self,
        id: PositionId,
        changes: PositionChanges,
    ) -> StoreResult<Position> {
        if self.fail_position_writes.load(Ordering::SeqCst) {
            warn!(position = id, "Rejecting position write (fault injection)");
            return Err(StoreError::Unavailable("position writes disabled".to_string()));
        }
        if let Some(amount) = changes.debt_amount {
            validate_amount("debt_amount", amount)?;
        }
        if let Some(amount) = changes.collateral_amount {
            validate_amount("collateral_amount", amount)?;
        }

        let mut position = self
            .positions
            .get_mut(&id)
            .ok_or_else(|| StoreError::position_not_found(id))?;
        if let Some(amount) = changes.debt_amount {
            position.debt_amount = amount;
        }
        if let Some(amount) = changes.collateral_amount {
            position.collateral_amount = Some(amount);
        }
        position.updated_at = Utc::now();
        Ok(position.clone())
    }
}

#[async_trait]
impl PriceSource for InMemoryStore {
    async fn list_assets(&self) -> StoreResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.assets.iter().map(|a| a.value().clone()).collect();
        assets.sort_by_key(|a| a.id);
        Ok(assets)
    }
}

#[async_trait]
impl TransactionLedger for InMemoryStore {
    async fn record_transaction(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        if self.fail_ledger_writes.load(Ordering::SeqCst) {
            warn!(user = tx.user_id, kind = %tx.kind, "Rejecting ledger write (fault injection)");
            return Err(StoreError::Unavailable("ledger writes disabled".to_string()));
        }
        validate_amount("amount", tx.amount)?;

        let transaction = Transaction {
            id: self.next_transaction_id.fetch_add(1, Ordering::Relaxed),
            kind: tx.kind,
            user_id: tx.user_id,
            asset_id: tx.asset_id,
            amount: tx.amount,
            from_asset_id: tx.from_asset_id,
            to_asset_id: tx.to_asset_id,
            status: tx.status,
            created_at: Utc::now(),
        };
        self.transactions.write().push(transaction.clone());
        Ok(transaction)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

fn validate_amount(field: &'static str, value: f64) -> StoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidValue { field, value })
    }
}

fn validate_price(value: f64) -> StoreResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StoreError::InvalidValue { field: "price", value })
    }
}
