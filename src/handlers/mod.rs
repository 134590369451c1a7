//! HTTP handlers for master CRUD and catalog UI config.

pub mod config;
pub mod masters;
pub use config::*;
pub use masters::*;
