//! Error types for the dataset cache
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
/// Unified error type for the dataset cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key-value store could not be reached at startup
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// A store command failed
    #[error("Store error: {0}")]
    Store(String),

    /// The source dataset could not be read
    #[error("Source error: {0}")]
    Source(String),

    /// A cached payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A dataset entry whose chunk fields are not a contiguous `0..N-1` range
    #[error("Corrupt cache entry: {0}")]
    CorruptEntry(String),

    /// Dataset name is not in the catalog
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    /// Source produced no rows, so no chunk was written
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for CacheError {
    fn from(err: csv::Error) -> Self {
        CacheError::Source(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Source(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnknownDataset(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Connection(_) | CacheError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::EmptyDataset(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Source(_)
            | CacheError::Serialization(_)
            | CacheError::CorruptEntry(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the dataset cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dataset_maps_to_not_found() {
        let response = CacheError::UnknownDataset("trains".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_error_maps_to_unavailable() {
        let response = CacheError::Store("broken pipe".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        assert!(matches!(CacheError::from(err), CacheError::Serialization(_)));
    }
}
