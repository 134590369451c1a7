//! Router assembly: common routes at the root, API routes under `/api`.

mod common;
mod config;
mod masters;

pub use common::{common_routes, common_routes_with_ready};
pub use config::config_routes;
pub use masters::master_routes;

use crate::state::AppState;
use axum::http::Method;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are refused with 413.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Full application router with CORS open to any origin.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ]);
    let api = Router::new()
        .merge(master_routes(state.clone()))
        .merge(config_routes(state.clone()));
    Router::new()
        .merge(common_routes_with_ready(state))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
                .layer(cors),
        )
}
