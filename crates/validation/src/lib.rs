//! `sampler-validation`: declarative per-field input constraints.
//!
//! A [`Schema`] is a list of [`Field`] descriptors. Each descriptor names where
//! the value comes from ([`Location`]), what it must coerce to ([`Kind`]) and
//! which [`Constraint`]s it must satisfy afterwards. [`Schema::validate`] runs
//! every field through the same three steps:
//!
//! 1. presence (required fields must be supplied),
//! 2. coercion (the raw text or JSON must parse as the declared kind),
//! 3. constraints (length, numeric bounds, pattern).
//!
//! All failures are collected into one [`ValidationErrors`]; nothing is
//! returned to the caller unless every field passed.
//!
//! This crate knows nothing about HTTP. Callers gather the raw request pieces
//! into a [`RawInput`] first.

mod coerce;
pub mod error;
pub mod field;
pub mod input;
pub mod schema;
mod validate;

pub use error::{ErrorKind, FieldError, LocSegment, ValidationErrors};
pub use field::{Constraint, Field, Kind, Location};
pub use input::RawInput;
pub use schema::Schema;
