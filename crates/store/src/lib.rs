//! Record store collaborators for the liquidation monitor.
//!
//! This crate provides:
//! - Record types shared with the monitor (users, assets, positions, transactions)
//! - Async collaborator contracts: position store, price source,
//!   transaction ledger and user directory
//! - An in-memory store implementing every contract, with fault injection
//!   for exercising failure paths
//!
//! Storage is plain bookkeeping; nothing here talks to a chain.

mod contracts;
mod error;
mod memory;
mod types;

pub use contracts::{PositionStore, PriceSource, TransactionLedger, UserDirectory};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use types::{
    Asset, AssetId, NewPosition, NewTransaction, Position, PositionChanges, PositionId,
    PositionKind, Transaction, TransactionId, TransactionKind, TransactionStatus, User, UserId,
};
