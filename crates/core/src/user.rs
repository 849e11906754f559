//! User records.
//!
//! `User` deliberately does not implement `Serialize`: the stored credential
//! must only ever leave the process through an explicit output shape.

use crate::error::DomainError;
use crate::id::UserId;
use crate::item::Item;

/// Suffix appended to a raw password to build the stored credential marker.
///
/// Demonstration only; this is not a hashing scheme.
pub const CREDENTIAL_MARKER_SUFFIX: &str = "notreallyhashed";

/// A persisted user together with the items it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub items: Vec<Item>,
}

/// A user that has been accepted for registration but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    email: String,
    hashed_password: String,
}

impl NewUser {
    /// Build a registration from raw input, deriving the stored credential.
    pub fn register(email: impl Into<String>, password: &str) -> Result<Self, DomainError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(DomainError::invariant("email must not be empty"));
        }
        Ok(Self {
            email,
            hashed_password: credential_marker(password),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn hashed_password(&self) -> &str {
        &self.hashed_password
    }
}

/// Derive the stored credential marker from a raw password.
pub fn credential_marker(password: &str) -> String {
    format!("{password}{CREDENTIAL_MARKER_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_derives_marker_and_drops_raw_password() {
        let new_user = NewUser::register("a@b.com", "hunter2").unwrap();
        assert_eq!(new_user.email(), "a@b.com");
        assert_eq!(new_user.hashed_password(), "hunter2notreallyhashed");
    }

    #[test]
    fn register_rejects_blank_email() {
        assert!(matches!(
            NewUser::register("   ", "pw"),
            Err(DomainError::InvariantViolation(_))
        ));
    }
}
