//! Master CRUD routes. The `:type` segment picks the master from the catalog at request time.

use crate::handlers::masters::{create, delete as delete_handler, list, update};
use crate::state::AppState;
use axum::{routing::get, routing::put, Router};

pub fn master_routes(state: AppState) -> Router {
    Router::new()
        .route("/masters/:type", get(list).post(create))
        .route("/masters/:type/:id", put(update).delete(delete_handler))
        .with_state(state)
}
