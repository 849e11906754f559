//! Bearer-token gate in front of protected routes.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};
use crate::principal::ActiveUser;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("not authenticated")]
    MissingCredentials,

    #[error("could not validate credentials: {0}")]
    InvalidToken(String),

    #[error("could not validate credentials: {0}")]
    Claims(#[from] TokenValidationError),

    #[error("inactive user")]
    Inactive,
}

impl AuthError {
    /// The caller is known but not allowed in (as opposed to unknown).
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::Inactive)
    }
}

/// Turns a bearer credential into the current active user.
///
/// Implementations must not perform IO on the request path beyond what the
/// credential itself carries; they are called once per protected request.
pub trait AuthGate: Send + Sync {
    fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<ActiveUser, AuthError>;
}

/// HS256-signed JWT gate.
///
/// Signature is checked by `jsonwebtoken`; the time window is checked by
/// [`validate_claims`] against the caller-supplied clock.
pub struct Hs256AuthGate {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256AuthGate {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = ["sub", "exp"].into_iter().map(String::from).collect();
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl AuthGate for Hs256AuthGate {
    fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<ActiveUser, AuthError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        validate_claims(&claims, now)?;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        if claims.disabled {
            tracing::debug!(user = %claims.sub, "rejecting disabled user");
            return Err(AuthError::Inactive);
        }

        Ok(ActiveUser::new(claims.sub))
    }
}
