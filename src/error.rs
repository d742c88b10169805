use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid interval: must be a positive integer")]
    InvalidInterval,
}

/// Per-entry failures while resolving a listening port's owner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessLookupError {
    #[error("process {0} no longer exists")]
    NoSuchProcess(u32),
    #[error("access to process {0} denied")]
    AccessDenied(u32),
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("cpu sampler failed: {0}")]
    Cpu(String),
    #[error("memory sampler failed: {0}")]
    Memory(String),
    #[error("collector task failed: {0}")]
    Collector(String),
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("failed to serialize sample: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to retrieve historical metrics")]
    History(#[source] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
