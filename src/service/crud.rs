//! Master CRUD execution against PostgreSQL.

use crate::config::MasterConfig;
use crate::error::{db_error_code, AppError};
use crate::response::{Deleted, Page};
use crate::service::RequestValidator;
use crate::sql::{count, delete, insert, select_page, update, ListCriteria, PgBindValue, QueryBuf};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use std::collections::HashMap;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 1000;

const IN_USE: &str = "Cannot delete: This record is used by other data.";

pub struct MasterService;

/// Page number and criteria parsed from list query params.
pub fn list_criteria<'a>(
    master: &'a MasterConfig,
    params: &HashMap<String, String>,
) -> (u32, ListCriteria<'a>) {
    let page = params
        .get("page")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1);
    let limit = params
        .get("limit")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&l| l >= 1)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    let search = params
        .get("search")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let filters = master
        .filters
        .iter()
        .filter_map(|f| {
            f.params
                .iter()
                .filter_map(|p| params.get(p))
                .find(|v| !v.is_empty())
                .map(|v| (f, v.clone()))
        })
        .collect();
    let criteria = ListCriteria {
        search,
        filters,
        limit,
        offset: u64::from(page - 1) * u64::from(limit),
    };
    (page, criteria)
}

impl MasterService {
    /// One page of rows plus the total count; both queries run concurrently.
    pub async fn find_all(
        pool: &PgPool,
        master: &MasterConfig,
        params: &HashMap<String, String>,
    ) -> Result<Page, AppError> {
        let (page, criteria) = list_criteria(master, params);
        let page_q = select_page(master, &criteria);
        let count_q = count(master, &criteria);
        let (rows, total) = tokio::try_join!(
            Self::query_many(pool, &page_q),
            Self::query_count(pool, &count_q),
        )?;
        Ok(Page::new(rows, total, page, criteria.limit))
    }

    /// Insert one row from the writable fields of body. Returns the created row.
    pub async fn create(pool: &PgPool, master: &MasterConfig, body: Value) -> Result<Value, AppError> {
        let fields = Self::writable_fields(master, body)?;
        RequestValidator::validate(&fields, master)?;
        let q = insert(master, &fields);
        Self::fetch_optional(pool, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. Only fields present in body are touched.
    pub async fn update(
        pool: &PgPool,
        master: &MasterConfig,
        id: &Value,
        body: Value,
    ) -> Result<Value, AppError> {
        let fields = Self::writable_fields(master, body)?;
        RequestValidator::validate_partial(&fields, master)?;
        let q = update(master, id, &fields);
        Self::fetch_optional(pool, &q)
            .await?
            .ok_or_else(|| AppError::NotFound("Record not found".into()))
    }

    /// Delete one row by id. A row still referenced by child masters is refused.
    pub async fn remove(pool: &PgPool, master: &MasterConfig, id: &Value) -> Result<Deleted, AppError> {
        let q = delete(master, id);
        match Self::fetch_optional(pool, &q).await {
            Ok(Some(_)) => Ok(Deleted {
                deleted: true,
                id: id.clone(),
            }),
            Ok(None) => Err(AppError::NotFound("Record not found".into())),
            Err(AppError::Db(e)) if db_error_code(&e).as_deref() == Some("23503") => {
                tracing::info!(master = %master.key, id = %id, "delete refused: record in use");
                Err(AppError::BadRequest(IN_USE.into()))
            }
            Err(e) => Err(e),
        }
    }

    /// Normalize body aliases, then keep writable columns only. Empty result is a bad request.
    fn writable_fields(master: &MasterConfig, body: Value) -> Result<Map<String, Value>, AppError> {
        let Value::Object(body) = body else {
            return Err(AppError::BadRequest("body must be a JSON object".into()));
        };
        let body = normalize_body(master, body);
        let fields: Map<String, Value> = body
            .into_iter()
            .filter(|(k, _)| master.column(k).is_some())
            .collect();
        if fields.is_empty() {
            tracing::warn!(master = %master.key, "no writable fields in body");
            return Err(AppError::BadRequest("No valid fields provided".into()));
        }
        Ok(fields)
    }

    async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_count(pool: &PgPool, q: &QueryBuf) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        Ok(query.fetch_one(pool).await?)
    }

    async fn fetch_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }
}

/// Apply body aliases (`stateID` -> `stateid`) and turn blank strings into NULL for non-text columns.
/// An alias only applies when its value is present and not blank; it overwrites the target key.
pub fn normalize_body(master: &MasterConfig, mut body: Map<String, Value>) -> Map<String, Value> {
    for (from, to) in &master.aliases {
        let Some(v) = body.remove(from) else { continue };
        let blank = v.is_null() || v.as_str().is_some_and(str::is_empty);
        if !blank {
            body.insert(to.clone(), v);
        }
    }
    for c in &master.columns {
        if c.pg_type() == "text" || c.pg_type() == "varchar" {
            continue;
        }
        if let Some(v) = body.get_mut(c.name()) {
            if v.as_str().is_some_and(|s| s.trim().is_empty()) {
                *v = Value::Null;
            }
        }
    }
    body
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i, col));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, i: usize, col: &sqlx::postgres::PgColumn) -> Value {
    use sqlx::{Column, Row, TypeInfo};
    fn num(n: Option<serde_json::Number>) -> Value {
        n.map(Value::Number).unwrap_or(Value::Null)
    }
    match col.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(i).ok().flatten().map_or(Value::Null, Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(i).ok().flatten().map_or(Value::Null, Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(i).ok().flatten().map_or(Value::Null, Value::from),
        "FLOAT4" => num(
            row.try_get::<Option<f32>, _>(i)
                .ok()
                .flatten()
                .and_then(|f| serde_json::Number::from_f64(f64::from(f))),
        ),
        "FLOAT8" => num(
            row.try_get::<Option<f64>, _>(i)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64),
        ),
        "BOOL" => row.try_get::<Option<bool>, _>(i).ok().flatten().map_or(Value::Null, Value::Bool),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)
            .ok()
            .flatten()
            .map_or(Value::Null, |d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string())),
        "NUMERIC" => row
            .try_get::<Option<sqlx::types::BigDecimal>, _>(i)
            .ok()
            .flatten()
            .map_or(Value::Null, |d| Value::String(d.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i).ok().flatten().unwrap_or(Value::Null),
        other => match row.try_get::<Option<String>, _>(i) {
            Ok(v) => v.map_or(Value::Null, Value::String),
            Err(e) => {
                tracing::debug!(column = %col.name(), pg_type = %other, error = %e, "column not decodable as text");
                Value::Null
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_builtin;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn paging_defaults_and_bounds() {
        let c = load_builtin().expect("catalog");
        let m = c.get("SKILLS").expect("skills");
        let (page, crit) = list_criteria(m, &params(&[]));
        assert_eq!((page, crit.limit, crit.offset), (1, 10, 0));

        let (page, crit) = list_criteria(m, &params(&[("page", "3"), ("limit", "25")]));
        assert_eq!((page, crit.limit, crit.offset), (3, 25, 50));

        let (page, crit) = list_criteria(m, &params(&[("page", "0"), ("limit", "abc")]));
        assert_eq!((page, crit.limit), (1, 10));

        let (_, crit) = list_criteria(m, &params(&[("limit", "50000")]));
        assert_eq!(crit.limit, 1000);
    }

    #[test]
    fn filters_match_any_param_name() {
        let c = load_builtin().expect("catalog");
        let m = c.get("DISTRICT").expect("district");
        let (_, crit) = list_criteria(m, &params(&[("stateID", "4"), ("unknown", "x"), ("search", " pu ")]));
        assert_eq!(crit.filters.len(), 1);
        assert_eq!(crit.filters[0].0.column, "stateid");
        assert_eq!(crit.filters[0].1, "4");
        assert_eq!(crit.search.as_deref(), Some("pu"));

        let (_, crit) = list_criteria(m, &params(&[("stateid", "4"), ("country_code", "IN")]));
        let cols: Vec<_> = crit.filters.iter().map(|(f, _)| f.column.as_str()).collect();
        assert_eq!(cols, vec!["stateid", "country_code"]);
    }

    #[test]
    fn empty_filter_values_are_ignored() {
        let c = load_builtin().expect("catalog");
        let m = c.get("STATE").expect("state");
        let (_, crit) = list_criteria(m, &params(&[("country_code", "")]));
        assert!(crit.filters.is_empty());
    }

    #[test]
    fn aliases_rename_body_keys() {
        let c = load_builtin().expect("catalog");
        let m = c.get("DISTRICT").expect("district");
        let body = normalize_body(m, object(json!({ "districtName": "Pune", "stateID": 4, "district": "old" })));
        assert_eq!(body.get("district"), Some(&json!("Pune")));
        assert_eq!(body.get("stateid"), Some(&json!(4)));
        assert!(!body.contains_key("stateID"));
    }

    #[test]
    fn blank_alias_does_not_overwrite() {
        let c = load_builtin().expect("catalog");
        let m = c.get("STATE").expect("state");
        let body = normalize_body(m, object(json!({ "stateName": "", "state": "Kerala" })));
        assert_eq!(body.get("state"), Some(&json!("Kerala")));
    }

    #[test]
    fn blank_numbers_become_null() {
        let c = load_builtin().expect("catalog");
        let m = c.get("COUNTRY").expect("country");
        let body = normalize_body(m, object(json!({ "advisor": " ", "country": "" })));
        assert_eq!(body.get("advisor"), Some(&Value::Null));
        assert_eq!(body.get("country"), Some(&json!("")));
    }

    #[test]
    fn writable_fields_rejects_unknown_only_bodies() {
        let c = load_builtin().expect("catalog");
        let m = c.get("INDUSTRY").expect("industry");
        let err = MasterService::writable_fields(m, json!({ "foo": 1 })).unwrap_err();
        assert_eq!(err.to_string(), "No valid fields provided");
        let err = MasterService::writable_fields(m, json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let ok = MasterService::writable_fields(m, json!({ "option": "Retail", "mastid": 9 })).expect("fields");
        assert_eq!(ok, object(json!({ "option": "Retail" })));
    }
}
