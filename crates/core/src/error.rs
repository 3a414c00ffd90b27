//! Monitor error type.

use monitor_store::{PositionId, StoreError};
use thiserror::Error;

use crate::events::EventId;

/// Errors surfaced to callers of the engine's control operations.
///
/// Tick-level failures are not represented here; a tick logs them and records
/// the abort reason in its report.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The referenced position does not exist.
    #[error("position {0} not found")]
    PositionNotFound(PositionId),

    /// The referenced liquidation event does not exist.
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// A configuration value is outside its domain.
    #[error("invalid {field} = {value}: {reason}")]
    InvalidConfig {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Another liquidation of the same position has not finished yet.
    #[error("liquidation of position {0} already in progress")]
    InProgress(PositionId),

    /// The executor was handed a position it cannot liquidate.
    #[error("position {0} cannot be liquidated: {1}")]
    NotLiquidatable(PositionId, &'static str),

    /// A collaborator call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MonitorError {
    /// Whether the error refers to a missing position or event.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::PositionNotFound(_) | Self::EventNotFound(_) => true,
            Self::Store(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Map a store lookup failure for `id`, turning a missing record into
    /// `PositionNotFound`.
    pub fn from_position_lookup(id: PositionId, err: StoreError) -> Self {
        if err.is_not_found() {
            Self::PositionNotFound(id)
        } else {
            Self::Store(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(MonitorError::PositionNotFound(7).to_string(), "position 7 not found");
        assert_eq!(
            MonitorError::InProgress(3).to_string(),
            "liquidation of position 3 already in progress"
        );

        let err = MonitorError::InvalidConfig {
            field: "liquidation_penalty",
            value: 0.5,
            reason: "must be in [0.05, 0.2]",
        };
        assert_eq!(err.to_string(), "invalid liquidation_penalty = 0.5: must be in [0.05, 0.2]");
    }

    #[test]
    fn test_position_lookup_mapping() {
        let err = MonitorError::from_position_lookup(9, StoreError::position_not_found(9));
        assert!(matches!(err, MonitorError::PositionNotFound(9)));
        assert!(err.is_not_found());

        let err =
            MonitorError::from_position_lookup(9, StoreError::Unavailable("down".to_string()));
        assert!(matches!(err, MonitorError::Store(StoreError::Unavailable(_))));
        assert!(!err.is_not_found());
    }
}
