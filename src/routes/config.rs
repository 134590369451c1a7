//! Catalog UI routes: form/grid definitions per master.

use crate::handlers::config::{get_master_ui, get_masters_ui};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn config_routes(state: AppState) -> Router {
    Router::new()
        .route("/config/masters", get(get_masters_ui))
        .route("/config/masters/:type", get(get_master_ui))
        .with_state(state)
}
