//! Shared application state for all routes.

use crate::config::{Catalog, MasterConfig};
use crate::error::AppError;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(pool: PgPool, catalog: Catalog) -> Self {
        AppState {
            pool,
            catalog: Arc::new(catalog),
        }
    }

    /// Master for a path type key, or 400 with the upper-cased key.
    pub fn master(&self, type_key: &str) -> Result<&MasterConfig, AppError> {
        self.catalog
            .get(type_key)
            .ok_or_else(|| AppError::InvalidType(type_key.to_uppercase()))
    }
}
