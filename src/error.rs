//! Error types for the cache-aside layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the store, the coordinator and the memoizer.
///
/// `Clone` because a single computation outcome is handed to every caller
/// waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store could not be reached (refused, dropped, I/O)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store operation exceeded its deadline
    #[error("Store timeout: {0}")]
    StoreTimeout(String),

    /// The store answered but refused the command (wrong type, overflow)
    #[error("Store rejected command: {0}")]
    StoreRejected(String),

    /// The wrapped operation returned an error
    #[error("Computation failed: {0}")]
    ComputationFailed(String),

    /// The wrapped operation did not finish within its time limit
    #[error("Computation timed out after {0}ms")]
    ComputationTimeout(u64),

    /// The caller owning the computation went away before it finished
    #[error("Computation cancelled: {0}")]
    Cancelled(String),

    /// Malformed memoizer or store arguments
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl CacheError {
    /// Returns true for transient infrastructure failures of the store.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::StoreUnavailable(_) | CacheError::StoreTimeout(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::StoreTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::StoreRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::ComputationFailed(_) => StatusCode::BAD_GATEWAY,
            CacheError::ComputationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache-aside layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CacheError::StoreUnavailable("down".into()).is_transient());
        assert!(CacheError::StoreTimeout("slow".into()).is_transient());
        assert!(!CacheError::StoreRejected("WRONGTYPE".into()).is_transient());
        assert!(!CacheError::ComputationFailed("boom".into()).is_transient());
        assert!(!CacheError::InvalidConfiguration("ttl".into()).is_transient());
    }

    #[test]
    fn test_status_mapping() {
        let resp = CacheError::StoreUnavailable("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = CacheError::ComputationFailed("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = CacheError::ComputationTimeout(50).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
