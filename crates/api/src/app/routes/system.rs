use axum::{Json, http::StatusCode};
use serde_json::{Value, json};
use utoipa::openapi::{OpenApi, path::HttpMethod};

use super::RouteDoc;
use crate::app::openapi::build_openapi;

const TITLE: &str = "sampler";

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello world" }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// OpenAPI 3 document covering every documented route.
pub async fn openapi() -> Json<OpenApi> {
    Json(build_openapi(TITLE, env!("CARGO_PKG_VERSION"), &super::docs()))
}

pub fn docs() -> Vec<RouteDoc> {
    vec![
        RouteDoc::new("System", HttpMethod::Get, "", "/", "Greeting").public(),
        RouteDoc::new("System", HttpMethod::Get, "", "/health", "Liveness check").public(),
        RouteDoc::new("System", HttpMethod::Get, "", "/openapi.json", "OpenAPI document").public(),
    ]
}
