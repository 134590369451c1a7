//! Master-data admin backend: catalog-driven CRUD over hierarchical reference tables.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use config::{load_builtin, load_catalog, load_from_path, load_from_str, Catalog, MasterConfig};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use response::{Deleted, Page};
pub use routes::{app, common_routes, common_routes_with_ready, config_routes, master_routes};
pub use service::MasterService;
pub use settings::Settings;
pub use state::AppState;
