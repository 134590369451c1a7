//! Router-level tests. The pool connects lazily to an unreachable address, so every
//! request exercised here must be answered before any query runs (or fail readiness).

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use master_data::routes::BODY_LIMIT_BYTES;
use master_data::{app, load_builtin, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;
use tower::ServiceExt;

fn router() -> Router {
    let opts = PgConnectOptions::new().host("127.0.0.1").port(1).database("masters");
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(opts);
    app(AppState::new(pool, load_builtin().expect("builtin catalog")))
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let resp = router().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn with_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn version_lists_catalog_keys() {
    let (status, body) = send(get("/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "master-data");
    assert_eq!(
        body["masters"],
        json!(["COUNTRY", "STATE", "DISTRICT", "PINCODE", "PINCODE_MASTER", "SKILLS", "INDUSTRY"])
    );
}

#[tokio::test]
async fn ready_reports_unreachable_database() {
    let (status, body) = send(get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn ui_config_for_all_masters() {
    let (status, body) = send(get("/api/config/masters")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 7);
    let country = &body["data"][0];
    assert_eq!(country["key"], "COUNTRY");
    assert_eq!(country["pk"], "country_code");
    assert_eq!(country["label"], "Country Master");
    assert_eq!(country["fields"][0]["maxLength"], 2);
    assert_eq!(country["columns"][1], json!({ "key": "country", "label": "Country" }));
}

#[tokio::test]
async fn ui_config_for_one_master_is_case_insensitive() {
    let (status, body) = send(get("/api/config/masters/district")).await;
    assert_eq!(status, StatusCode::OK);
    let state_field = &body["data"]["fields"][1];
    assert_eq!(state_field["lookupMaster"], "STATE");
    assert_eq!(state_field["parentField"], "country_code");
    assert_eq!(state_field["type"], "dropdown");
    assert_eq!(state_field["required"], true);
}

#[tokio::test]
async fn unknown_master_type_is_bad_request() {
    let (status, body) = send(get("/api/masters/planet?page=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "Invalid Master Type: PLANET");

    let (status, _) = send(get("/api/config/masters/planet")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_without_known_fields_is_rejected() {
    let (status, body) = send(with_json(Method::POST, "/api/masters/skills", json!({ "foo": "bar" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No valid fields provided");
}

#[tokio::test]
async fn create_checks_field_rules_before_touching_the_database() {
    let req = with_json(
        Method::POST,
        "/api/masters/COUNTRY",
        json!({ "country_code": "IND", "country": "India" }),
    );
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let req = with_json(Method::POST, "/api/masters/state", json!({ "stateName": "Kerala", "country_code": "IN" }));
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "State Code is required");
}

#[tokio::test]
async fn non_numeric_id_for_generated_key_is_rejected() {
    let (status, body) = send(with_json(Method::PUT, "/api/masters/state/abc", json!({ "state": "Goa" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid id");

    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/masters/district/x1")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/masters/country")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .body(Body::empty())
        .expect("request");
    let resp = router().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let payload = vec![b' '; BODY_LIMIT_BYTES + 1];
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/masters/skills")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .expect("request");
    let resp = router().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/masters/skills")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"optionname\": "))
        .expect("request");
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "bad_request");

    let req = Request::builder()
        .method(Method::PUT)
        .uri("/api/masters/skills/1")
        .body(Body::from(r#"{"optionname":"Rust"}"#))
        .expect("request");
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
}

#[tokio::test]
async fn wrongly_typed_values_are_rejected_before_the_database() {
    let req = with_json(Method::POST, "/api/masters/district", json!({ "district": "X", "stateid": true }));
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "State must be a whole number");
}
