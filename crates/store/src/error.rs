//! Store error type.

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by record store collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A write carried a value the store refuses to hold.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// The backing store could not complete the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn position_not_found(id: u64) -> Self {
        Self::NotFound { entity: "position", id }
    }

    /// Whether the error refers to a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
