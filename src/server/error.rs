use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;

use crate::KvStoreError;

/// Error wrapper converting engine outcomes into HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The engine rejected or failed the operation.
    Store(KvStoreError),
    /// The blocking task running the operation died.
    Task(tokio::task::JoinError),
}

/// Body of every error response.
#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(KvStoreError::KeyNotFound) => StatusCode::NOT_FOUND,
            ApiError::Store(KvStoreError::EmptyKey) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                error!("storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Task(e) => {
                error!("engine task failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = match self {
            ApiError::Store(e) => e.to_string(),
            ApiError::Task(_) => "internal error".to_owned(),
        };

        (status, Json(Detail { detail })).into_response()
    }
}

impl From<KvStoreError> for ApiError {
    fn from(err: KvStoreError) -> ApiError {
        ApiError::Store(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> ApiError {
        ApiError::Task(err)
    }
}
