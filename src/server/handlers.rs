//! HTTP route handlers. Each one runs exactly one engine operation.

use axum::extract::{Path, State};
use axum::Json;
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::{KvsEngine, Record, Result};

/// Shared application state.
#[derive(Clone)]
pub struct AppState<E> {
    pub engine: E,
}

/// Body of POST /kv/:key.
#[derive(Deserialize)]
pub struct UpsertBody {
    pub value: String,
}

/// Body of a successful DELETE /kv/:key.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Engines do blocking I/O, keep it off the async workers.
async fn blocking<E, T, F>(engine: E, op: F) -> std::result::Result<T, ApiError>
where
    E: KvsEngine,
    T: Send + 'static,
    F: FnOnce(E) -> Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || op(engine)).await?;

    Ok(result?)
}

/// Handle POST /kv/:key
pub async fn handle_upsert<E: KvsEngine>(
    State(state): State<AppState<E>>,
    Path(key): Path<String>,
    Json(body): Json<UpsertBody>,
) -> std::result::Result<Json<Record>, ApiError> {
    debug!("upsert '{}'", key);

    let record = blocking(state.engine, move |e| e.upsert(key, body.value)).await?;

    Ok(Json(record))
}

/// Handle GET /kv/:key
pub async fn handle_get<E: KvsEngine>(
    State(state): State<AppState<E>>,
    Path(key): Path<String>,
) -> std::result::Result<Json<Record>, ApiError> {
    debug!("get '{}'", key);

    let record = blocking(state.engine, move |e| e.get(key)).await?;

    Ok(Json(record))
}

/// Handle GET /kv/
pub async fn handle_list<E: KvsEngine>(
    State(state): State<AppState<E>>,
) -> std::result::Result<Json<Vec<Record>>, ApiError> {
    let records = blocking(state.engine, |e| e.list()).await?;

    debug!("listed {} records", records.len());

    Ok(Json(records))
}

/// Handle DELETE /kv/:key
pub async fn handle_delete<E: KvsEngine>(
    State(state): State<AppState<E>>,
    Path(key): Path<String>,
) -> std::result::Result<Json<MessageResponse>, ApiError> {
    debug!("delete '{}'", key);

    blocking(state.engine, move |e| e.delete(key)).await?;

    Ok(Json(MessageResponse {
        message: "Key deleted successfully".to_owned(),
    }))
}
