//! Catalog UI handlers: form and grid definitions for clients.

use crate::error::AppError;
use crate::response::success_many;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

/// GET /api/config/masters: every master's UI definition in catalog order.
pub async fn get_masters_ui(State(state): State<AppState>) -> impl IntoResponse {
    success_many(state.catalog.ui_all())
}

/// GET /api/config/masters/:type
pub async fn get_master_ui(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ui = state
        .catalog
        .ui(&type_key)
        .ok_or_else(|| AppError::InvalidType(type_key.to_uppercase()))?;
    Ok(Json(serde_json::json!({ "data": ui })))
}
