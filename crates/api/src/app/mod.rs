//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store session provider and demo key/value store
//! - `routes/`: HTTP routes + handlers (one file per route group)
//! - `extract.rs`: validated-input and per-request session extractors
//! - `shape.rs`: response contracts
//! - `openapi.rs`: OpenAPI document built from route metadata
//! - `dto.rs`: request contracts shared by the store-backed groups
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use sampler_auth::Hs256AuthGate;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod shape;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(config: &AppConfig, services: AppServices) -> Router {
    let gate = Arc::new(Hs256AuthGate::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { gate };

    // Protected routes: the auth gate runs before any extractor.
    let protected = routes::protected().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public())
        .merge(protected)
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
}

/// Fixed origin allow-list, credentials allowed.
///
/// Wildcards cannot be combined with credentials, so methods and headers
/// mirror whatever the preflight asks for.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.cors_origins.clone())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
