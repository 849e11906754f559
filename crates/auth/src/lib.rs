//! `sampler-auth`: the "current active user" gate.
//!
//! This crate is intentionally decoupled from HTTP and storage: it turns a
//! bearer credential into an [`ActiveUser`] or an [`AuthError`]. Issuing
//! tokens is someone else's job.

pub mod claims;
pub mod gate;
pub mod principal;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use gate::{AuthError, AuthGate, Hs256AuthGate};
pub use principal::ActiveUser;
