//! Load the master catalog from the embedded JSON or from a file.

use crate::config::{validate, Catalog, CatalogConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Catalog shipped with the crate.
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/masters.json");

/// Parse and validate a catalog from JSON text.
pub fn load_from_str(raw: &str) -> Result<Catalog, ConfigError> {
    let config: CatalogConfig = serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&config)?;
    tracing::debug!(masters = config.masters.len(), "catalog validated");
    Ok(Catalog::from_config(config))
}

pub fn load_builtin() -> Result<Catalog, ConfigError> {
    load_from_str(BUILTIN_CATALOG)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Catalog, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&raw)
}

/// Load from `path` when given, otherwise the embedded catalog.
pub async fn load_catalog(path: Option<&Path>) -> Result<Catalog, ConfigError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading master catalog");
            load_from_path(p).await
        }
        None => load_builtin(),
    }
}
