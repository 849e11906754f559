use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use sampler_auth::{AuthError, AuthGate};

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<dyn AuthGate>,
}

/// Runs the auth gate before any protected handler. A rejected request never
/// reaches the handler (nor its extractors, so no session is acquired).
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let user = state.gate.authenticate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "auth gate rejected request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;

    let header = header.to_str().map_err(|_| AuthError::MissingCredentials)?;

    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingCredentials)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredentials);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}
