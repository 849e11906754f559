use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use sampler_auth::ActiveUser;

use crate::app::errors::ApiError;

/// The user the auth gate let in.
///
/// Only available behind the auth middleware; extracting it anywhere else is
/// a wiring bug and is reported as 401 rather than letting the handler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub ActiveUser);

impl CurrentUser {
    pub fn username(&self) -> &str {
        self.0.username()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActiveUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("not authenticated".to_string()))
    }
}
