//! Response envelopes for list pages, single rows, and deletes.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

/// One page of a master grid.
#[derive(Debug, Serialize)]
pub struct Page {
    pub data: Vec<Value>,
    pub total: i64,
    pub page: u32,
    #[serde(rename = "lastPage")]
    pub last_page: i64,
}

impl Page {
    pub fn new(data: Vec<Value>, total: i64, page: u32, limit: u32) -> Self {
        let limit = i64::from(limit.max(1));
        Page {
            data,
            total,
            page,
            last_page: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
    pub id: Value,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn created(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(row))
}

pub fn ok(row: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(row))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}
