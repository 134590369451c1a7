//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid {what} identifier '{name}' in master {master}")]
    InvalidIdentifier { master: String, what: String, name: String },
    #[error("duplicate master key: {0}")]
    DuplicateKey(String),
    #[error("duplicate alias '{alias}' in master {master}")]
    DuplicateAlias { master: String, alias: String },
    #[error("catalog load: {0}")]
    Load(String),
    #[error("setting {name}: {message}")]
    Setting { name: &'static str, message: String },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid Master Type: {0}")]
    InvalidType(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

/// SQLSTATE of the underlying database error, when there is one.
pub fn db_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Status and code for a database error. Constraint violations are the caller's fault.
fn db_status(err: &sqlx::Error) -> (StatusCode, &'static str) {
    if let sqlx::Error::RowNotFound = err {
        return (StatusCode::NOT_FOUND, "not_found");
    }
    sqlstate_status(db_error_code(err).as_deref())
}

fn sqlstate_status(code: Option<&str>) -> (StatusCode, &'static str) {
    match code {
        Some("23505") => (StatusCode::CONFLICT, "conflict"),
        Some("23503") => (StatusCode::BAD_REQUEST, "foreign_key_violation"),
        // not-null, check, bad text representation, too long, out of range, bad datetime, cannot cast
        Some("23502" | "23514" | "22P02" | "22001" | "22003" | "22007" | "22008" | "42846" | "42804") => {
            (StatusCode::BAD_REQUEST, "bad_request")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
    }
}

/// Error envelope. `statusCode`/`message` keep the shape admin clients already read.
#[derive(Serialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::InvalidType(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::Db(e) => db_status(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            status_code: status.as_u16(),
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
