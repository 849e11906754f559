//! Ordered collections of field descriptors.

use serde_json::{Map, Value};

use crate::error::ValidationErrors;
use crate::field::{Field, Location};
use crate::input::RawInput;

/// The full input contract of one operation (or one nested body model).
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema. Field names must be unique; duplicates are a
    /// programming error and panic.
    pub fn new(fields: Vec<Field>) -> Self {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                panic!("duplicate field `{}` in schema", field.name());
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn body_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.location() == Location::Body)
    }

    /// Whether the request body *is* the single body field (not wrapped in an
    /// object keyed by field name).
    pub fn has_bare_body(&self) -> bool {
        let mut body = self.body_fields();
        matches!((body.next(), body.next()), (Some(only), None) if !only.is_embedded())
    }

    /// Validate raw request input against every field.
    ///
    /// On success the map holds one entry per declared field: the coerced
    /// value, its default, or `null` for an absent optional field.
    pub fn validate(&self, input: &RawInput) -> Result<Map<String, Value>, ValidationErrors> {
        crate::validate::validate_request(self, input)
    }
}
