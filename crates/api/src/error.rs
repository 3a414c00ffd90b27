//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use monitor_core::MonitorError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by operator API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Malformed request body or parameters
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Monitor(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            Self::Monitor(MonitorError::InvalidConfig { .. }) => StatusCode::BAD_REQUEST,
            Self::Monitor(MonitorError::InProgress(_) | MonitorError::NotLiquidatable(..)) => {
                StatusCode::CONFLICT
            }
            Self::Monitor(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MonitorError::PositionNotFound(1), StatusCode::NOT_FOUND),
            (MonitorError::EventNotFound(1), StatusCode::NOT_FOUND),
            (
                MonitorError::InvalidConfig {
                    field: "liquidation_penalty",
                    value: 0.9,
                    reason: "must be in [0.05, 0.2]",
                },
                StatusCode::BAD_REQUEST,
            ),
            (MonitorError::InProgress(1), StatusCode::CONFLICT),
            (
                MonitorError::Store(StoreError::Unavailable("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(ApiError::BadRequest("bad".to_string()).status(), StatusCode::BAD_REQUEST);
    }
}
