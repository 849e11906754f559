//! Request extractors: validated input contracts and per-request sessions.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::{HeaderValue, header};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sampler_infra::SessionHandle;
use sampler_validation::{ErrorKind, FieldError, RawInput, Schema, ValidationErrors};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Typed input of one operation together with the schema that guards it.
///
/// The schema's validated output map is deserialized into `Self`, so field
/// names must line up with the schema's field names.
pub trait Contract: DeserializeOwned + Send {
    fn schema() -> &'static Schema;
}

/// Declare the schema of a [`Contract`] once, built lazily on first use.
macro_rules! contract {
    ($ty:ty => $fields:expr) => {
        impl $crate::app::extract::Contract for $ty {
            fn schema() -> &'static ::sampler_validation::Schema {
                static SCHEMA: ::std::sync::LazyLock<::sampler_validation::Schema> =
                    ::std::sync::LazyLock::new(|| ::sampler_validation::Schema::new($fields));
                &SCHEMA
            }
        }
    };
}
pub(crate) use contract;

/// Input that passed every declared constraint.
///
/// Path parameters, the query string, headers, cookies and (when the contract
/// declares body fields) the JSON body are all gathered and checked in one
/// pass, so a rejection lists every failing field. Must be the last extractor
/// of a handler because it consumes the body.
#[derive(Debug)]
pub struct Valid<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Contract,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let schema = T::schema();
        let (mut parts, body) = req.into_parts();

        let mut input = raw_input(&mut parts, state).await;

        if schema.body_fields().next().is_some() {
            let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
                .await
                .map_err(|e| ApiError::BodyRead(e.status(), e.body_text()))?;
            if !bytes.is_empty() {
                let body: Value =
                    serde_json::from_slice(&bytes).map_err(|e| invalid_body(e.to_string()))?;
                input.set_body(Some(body));
            }
        }

        let values = schema.validate(&input)?;
        serde_json::from_value(Value::Object(values))
            .map(Valid)
            .map_err(|e| ApiError::Internal(format!("validated input does not fit its contract: {e}")))
    }
}

async fn raw_input<S: Send + Sync>(parts: &mut Parts, state: &S) -> RawInput {
    let mut input = RawInput::new();

    // Routes without parameters make `Path` fail; that just means "none".
    if let Ok(Path(params)) = Path::<HashMap<String, String>>::from_request_parts(parts, state).await {
        input.extend_path(params);
    }

    if let Some(query) = parts.uri.query() {
        input.extend_query_string(query);
    }

    for (name, value) in &parts.headers {
        let value = header_text(value);
        if *name == header::COOKIE {
            input.extend_cookie_header(&value);
        }
        input.push_header(name.as_str(), value);
    }

    input
}

/// Header bytes outside visible ASCII are read as Latin-1.
fn header_text(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(value.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

fn invalid_body(msg: String) -> ApiError {
    ApiError::Validation(ValidationErrors::single(FieldError::new(
        vec!["body".into()],
        ErrorKind::JsonInvalid,
        msg,
    )))
}

/// Access to the store for the current request.
///
/// Nothing is acquired until [`DbSession::open`] runs, so handlers open the
/// session in their body, after every input extractor has passed. The opened
/// handle is released when it is dropped, whichever way the handler returns.
#[derive(Debug, Clone)]
pub struct DbSession(Arc<AppServices>);

impl DbSession {
    pub async fn open(&self) -> Result<SessionHandle, ApiError> {
        Ok(self.0.sessions.acquire().await?)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for DbSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<AppServices>>()
            .cloned()
            .map(DbSession)
            .ok_or_else(|| ApiError::Internal("services extension missing".to_string()))
    }
}
