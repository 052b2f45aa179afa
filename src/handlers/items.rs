use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    metrics::QueryType,
    models::{Item, ItemPayload, NewItem},
    AppState,
};

pub const ITEM_NOT_FOUND: &str = "Item not found";

fn validated(payload: Result<Json<ItemPayload>, JsonRejection>) -> AppResult<NewItem> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(%rejection, "Rejected item body");
        AppError::BadRequest(rejection.body_text())
    })?;
    payload.validate()
}

/// A non-integer id can't match any row.
fn item_id(id: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound(ITEM_NOT_FOUND.to_string()))
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_items(State(state): State<AppState>) -> AppResult<(StatusCode, Json<Vec<Item>>)> {
    let start = Instant::now();
    let items = state.store.list().await?;
    let elapsed = start.elapsed();

    state.metrics.record(QueryType::Select, elapsed).await;
    debug!(count = items.len(), elapsed_ms = elapsed.as_millis() as u64, "Listed items");

    Ok((StatusCode::OK, Json(items)))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let item = validated(payload)?;

    let start = Instant::now();
    let id = state.store.insert(&item).await?;
    let elapsed = start.elapsed();

    state.metrics.record(QueryType::Insert, elapsed).await;
    info!(id, name = %item.name, "Created item");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Item created successfully", "id": id })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let item = validated(payload)?;
    let id = item_id(id)?;

    let start = Instant::now();
    let affected = state.store.update(id, &item).await?;
    let elapsed = start.elapsed();

    state.metrics.record(QueryType::Update, elapsed).await;

    if affected == 0 {
        return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
    }
    info!(id, "Updated item");

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Item updated successfully" })),
    ))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_item(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let id = item_id(id)?;

    let start = Instant::now();
    let affected = state.store.delete(id).await?;
    let elapsed = start.elapsed();

    state.metrics.record(QueryType::Delete, elapsed).await;

    if affected == 0 {
        return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
    }
    info!(id, "Deleted item");

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Item deleted successfully" })),
    ))
}
