//! `sampler-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no HTTP, no storage).

pub mod error;
pub mod id;
pub mod item;
pub mod user;

pub use error::DomainError;
pub use id::{ItemId, UserId};
pub use item::{Item, NewItem};
pub use user::{NewUser, User};
