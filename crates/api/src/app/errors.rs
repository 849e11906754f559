use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

use sampler_auth::AuthError;
use sampler_core::DomainError;
use sampler_infra::StoreError;
use sampler_validation::ValidationErrors;

/// Everything a handler (or extractor) can fail with.
///
/// Each variant has one status code; the body is always
/// `{"error": code, "message": msg}`, plus `detail` for validation failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(ValidationErrors),

    /// The body could not be read at all; carries the status axum chose.
    #[error("{1}")]
    BodyRead(StatusCode, String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BodyRead(status, _) => *status,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BodyRead(..) => "unreadable_body",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "not_authenticated",
            ApiError::Forbidden(_) => "inactive_user",
            ApiError::StoreUnavailable(_) => "store_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        let mut response = match self {
            ApiError::Validation(errors) => json_error_with(
                status,
                code,
                message,
                json!({ "detail": errors }),
            ),
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                json_error(status, code, "internal server error")
            }
            _ => json_error(status, code, message),
        };

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "store unavailable");
                ApiError::StoreUnavailable("store unavailable".to_string())
            }
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::MissingReference(msg) => ApiError::NotFound(format!("{msg} not found")),
            StoreError::Released | StoreError::Backend(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_forbidden() {
            ApiError::Forbidden(err.to_string())
        } else {
            ApiError::Unauthorized(err.to_string())
        }
    }
}

/// Input contracts run before any domain constructor, so a domain rejection
/// past validation means the two disagree.
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// [`json_error`] with extra top-level members merged in.
pub fn json_error_with(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    extra: Value,
) -> Response {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (status, axum::Json(body)).into_response()
}
