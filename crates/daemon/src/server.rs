// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface over the store.
//!
//! Mutations are logged first and applied to the store second, under one
//! lock, so the store and the log agree on mutation order.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::put;
use axum::Router;
use kvs_core::KeyValueStore;
use kvs_storage::TransactionLogger;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn KeyValueStore>,
    logger: Arc<dyn TransactionLogger>,
    writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, logger: Arc<dyn TransactionLogger>) -> Self {
        Self {
            store,
            logger,
            writes: Arc::new(Mutex::new(())),
        }
    }
}

/// Build the `/v1/{key}` router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/{key}",
            put(put_value).get(get_value).delete(delete_value),
        )
        .with_state(state)
}

async fn put_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    value: String,
) -> Result<StatusCode, ApiError> {
    let _guard = state.writes.lock().await;
    state.logger.write_put(&key, &value).await?;
    state.store.put(&key, &value)?;

    debug!(key, value_len = value.len(), "put");
    Ok(StatusCode::CREATED)
}

async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<String, ApiError> {
    Ok(state.store.get(&key)?)
}

async fn delete_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.writes.lock().await;
    state.logger.write_delete(&key).await?;
    state.store.delete(&key)?;

    debug!(key, "delete");
    Ok(StatusCode::OK)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
