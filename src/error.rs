//! Error types for the cache engine and server
//!
//! Provides unified error handling using thiserror.
//!
//! Storage faults never reach callers of the cache contract; they degrade
//! to misses or `false` returns inside the engine. The variants here carry
//! caller-contract faults (bad requests, malformed patterns) and the
//! internal storage/serialization errors the disk store logs and swallows.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its serving surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in either tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed invalidation pattern; surfaced immediately rather than
    /// silently matching nothing
    #[error("Invalid invalidation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Filesystem fault in the disk store
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Entry (de)serialization fault
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidPattern(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Storage(_) | CacheError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
