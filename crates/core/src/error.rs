use thiserror::Error;

/// Rejections raised while building users, items and their ids.
///
/// Lookups and uniqueness are the store's business, not this type's.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value broke a rule of the record it was meant for.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An id was unparseable or below 1.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rule() {
        assert_eq!(
            DomainError::invariant("price must be greater than 0").to_string(),
            "invariant violated: price must be greater than 0"
        );
        assert_eq!(DomainError::invalid_id("UserId: 0").to_string(), "invalid identifier: UserId: 0");
    }
}
