use axum::Router;
use utoipa::openapi::path::HttpMethod;

use sampler_validation::Schema;

use crate::app::extract::Contract;

pub mod items;
pub mod others;
pub mod system;
pub mod users;

/// Router for every endpoint behind the auth gate.
pub fn protected() -> Router {
    Router::new()
        .nest(items::PREFIX, items::router())
        .nest(users::PREFIX, users::router())
        .nest(others::PREFIX, others::router())
}

/// Router for endpoints anyone may call.
pub fn public() -> Router {
    Router::new()
        .route("/", axum::routing::get(system::root))
        .route("/health", axum::routing::get(system::health))
        .route("/openapi.json", axum::routing::get(system::openapi))
}

/// Documentation entry for one route.
#[derive(Debug, Clone)]
pub struct RouteDoc {
    pub method: HttpMethod,
    pub path: String,
    pub summary: &'static str,
    pub description: Option<&'static str>,
    pub status: u16,
    pub auth: bool,
    pub tag: &'static str,
    input: Option<fn() -> &'static Schema>,
}

impl RouteDoc {
    /// A protected route answering 200. `path` is relative to `prefix`.
    pub fn new(tag: &'static str, method: HttpMethod, prefix: &str, path: &str, summary: &'static str) -> Self {
        Self {
            method,
            path: format!("{prefix}{path}"),
            summary,
            description: None,
            status: 200,
            auth: true,
            tag,
            input: None,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn public(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn input<C: Contract>(mut self) -> Self {
        self.input = Some(C::schema);
        self
    }

    pub fn schema(&self) -> Option<&'static Schema> {
        self.input.map(|schema| schema())
    }

    /// Path in OpenAPI template form.
    pub fn template_path(&self) -> String {
        template_path(&self.path)
    }
}

/// Every documented route, public ones first.
pub fn docs() -> Vec<RouteDoc> {
    let mut all = system::docs();
    all.extend(items::docs());
    all.extend(users::docs());
    all.extend(others::docs());
    all
}

/// `/users/:user_id` is documented as `/users/{user_id}`.
fn template_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
