//! Master CRUD handlers: list page, create, update, delete.

use crate::config::PkType;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::response::{created, ok};
use crate::service::MasterService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn parse_id(id_str: &str, pk_type: PkType) -> Result<Value, AppError> {
    Ok(match pk_type {
        PkType::Int8 => {
            let n: i64 = id_str
                .trim()
                .parse()
                .map_err(|_| AppError::BadRequest("invalid id".into()))?;
            Value::Number(n.into())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

/// GET /api/masters/:type with `page`, `limit`, `search`, plus the master's filter params.
pub async fn list(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let master = state.master(&type_key)?;
    tracing::debug!(master = %master.key, query = ?params, "list");
    let page = MasterService::find_all(&state.pool, master, &params).await?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let master = state.master(&type_key)?;
    let row = MasterService::create(&state.pool, master, body).await?;
    tracing::info!(master = %master.key, "record created");
    Ok(created(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((type_key, id_str)): Path<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let master = state.master(&type_key)?;
    let id = parse_id(&id_str, master.pk_type)?;
    let row = MasterService::update(&state.pool, master, &id, body).await?;
    tracing::info!(master = %master.key, id = %id, "record updated");
    Ok(ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((type_key, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let master = state.master(&type_key)?;
    let id = parse_id(&id_str, master.pk_type)?;
    let deleted = MasterService::remove(&state.pool, master, &id).await?;
    tracing::info!(master = %master.key, id = %id, "record deleted");
    Ok(Json(deleted))
}
