//! Field-level validation failures.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// One segment of the path to a failing value, e.g. `["body", "images", 0, "url"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for LocSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<usize> for LocSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl core::fmt::Display for LocSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LocSegment::Key(k) => f.write_str(k),
            LocSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Machine-readable reason a value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Missing,
    NoneNotAllowed,
    Integer,
    Float,
    Bool,
    Str,
    Enum,
    Url,
    DateTime,
    List,
    Object,
    MinLength,
    MaxLength,
    Gt,
    Ge,
    Lt,
    Le,
    Pattern,
    JsonInvalid,
}

impl ErrorKind {
    /// Stable dotted code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "value_error.missing",
            ErrorKind::NoneNotAllowed => "type_error.none.not_allowed",
            ErrorKind::Integer => "type_error.integer",
            ErrorKind::Float => "type_error.float",
            ErrorKind::Bool => "type_error.bool",
            ErrorKind::Str => "type_error.str",
            ErrorKind::Enum => "type_error.enum",
            ErrorKind::Url => "value_error.url",
            ErrorKind::DateTime => "value_error.datetime",
            ErrorKind::List => "type_error.list",
            ErrorKind::Object => "type_error.dict",
            ErrorKind::MinLength => "value_error.any_str.min_length",
            ErrorKind::MaxLength => "value_error.any_str.max_length",
            ErrorKind::Gt => "value_error.number.not_gt",
            ErrorKind::Ge => "value_error.number.not_ge",
            ErrorKind::Lt => "value_error.number.not_lt",
            ErrorKind::Le => "value_error.number.not_le",
            ErrorKind::Pattern => "value_error.str.regex",
            ErrorKind::JsonInvalid => "value_error.jsondecode",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A single rejected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl FieldError {
    pub fn new(loc: Vec<LocSegment>, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind,
        }
    }

    /// Dotted form of the location, e.g. `query.q` or `body.images.0.url`.
    pub fn path(&self) -> String {
        self.loc
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Every failure found in one request, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("{} validation error(s): {}", .0.len(), summary(.0))]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.path(), e.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any failure is located exactly at `path` (dotted form).
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path() == path)
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
