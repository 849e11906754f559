//! Constraint descriptors.

use std::borrow::Cow;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorKind;
use crate::schema::Schema;

/// Where in the request a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
            Location::Body => "body",
        }
    }
}

/// The type a raw value must coerce to.
#[derive(Debug, Clone)]
pub enum Kind {
    Int,
    Float,
    Str,
    Bool,
    /// Closed set of accepted string values.
    Enum(&'static [&'static str]),
    /// Absolute `http`/`https` URL, normalized on output.
    Url,
    /// RFC 3339 timestamp, normalized on output.
    DateTime,
    /// Zero or more values, order kept.
    List(Box<Kind>),
    /// Zero or more values, duplicates dropped (first occurrence wins).
    Set(Box<Kind>),
    /// Nested JSON object with its own schema.
    Object(Schema),
}

impl Kind {
    pub fn list(inner: Kind) -> Self {
        Kind::List(Box::new(inner))
    }

    pub fn set(inner: Kind) -> Self {
        Kind::Set(Box::new(inner))
    }
}

/// A rule applied after coercion succeeded.
///
/// Length rules apply to strings (counted in chars), bound rules to numbers.
/// A rule that does not apply to the coerced value's type is ignored.
#[derive(Debug, Clone)]
pub enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    Pattern(Regex),
}

impl Constraint {
    pub(crate) fn check(&self, value: &Value) -> Result<(), (ErrorKind, String)> {
        match (self, value) {
            (Constraint::MinLength(min), Value::String(s)) if s.chars().count() < *min => Err((
                ErrorKind::MinLength,
                format!("ensure this value has at least {min} characters"),
            )),
            (Constraint::MaxLength(max), Value::String(s)) if s.chars().count() > *max => Err((
                ErrorKind::MaxLength,
                format!("ensure this value has at most {max} characters"),
            )),
            (Constraint::Pattern(re), Value::String(s)) if !re.is_match(s) => Err((
                ErrorKind::Pattern,
                format!("string does not match regex \"{}\"", re.as_str()),
            )),
            (Constraint::Gt(bound), Value::Number(n)) => bound_check(n.as_f64(), |v| v > *bound)
                .ok_or((ErrorKind::Gt, format!("ensure this value is greater than {bound}"))),
            (Constraint::Ge(bound), Value::Number(n)) => bound_check(n.as_f64(), |v| v >= *bound)
                .ok_or((
                    ErrorKind::Ge,
                    format!("ensure this value is greater than or equal to {bound}"),
                )),
            (Constraint::Lt(bound), Value::Number(n)) => bound_check(n.as_f64(), |v| v < *bound)
                .ok_or((ErrorKind::Lt, format!("ensure this value is less than {bound}"))),
            (Constraint::Le(bound), Value::Number(n)) => bound_check(n.as_f64(), |v| v <= *bound)
                .ok_or((
                    ErrorKind::Le,
                    format!("ensure this value is less than or equal to {bound}"),
                )),
            _ => Ok(()),
        }
    }
}

fn bound_check(value: Option<f64>, ok: impl Fn(f64) -> bool) -> Option<()> {
    value.filter(|v| ok(*v)).map(|_| ())
}

/// Descriptor for one named input value.
///
/// Built with the constructor for its location, then refined:
///
/// ```
/// use sampler_validation::{Field, Kind};
///
/// let q = Field::query("q", Kind::Str)
///     .optional()
///     .max_length(50)
///     .pattern("^fixedquery$");
/// assert!(!q.is_required());
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    location: Location,
    kind: Kind,
    required: bool,
    default: Option<Value>,
    constraints: Vec<Constraint>,
    deprecated: bool,
    convert_underscores: bool,
    embed: bool,
    title: Option<&'static str>,
    description: Option<&'static str>,
}

impl Field {
    fn new(name: &'static str, location: Location, kind: Kind) -> Self {
        Self {
            name,
            location,
            kind,
            required: true,
            default: None,
            constraints: Vec::new(),
            deprecated: false,
            convert_underscores: true,
            embed: false,
            title: None,
            description: None,
        }
    }

    /// Path parameters are always required.
    pub fn path(name: &'static str, kind: Kind) -> Self {
        Self::new(name, Location::Path, kind)
    }

    pub fn query(name: &'static str, kind: Kind) -> Self {
        Self::new(name, Location::Query, kind)
    }

    /// Header field; `user_agent` is matched against wire name `user-agent`
    /// unless [`Field::literal_name`] is applied.
    pub fn header(name: &'static str, kind: Kind) -> Self {
        Self::new(name, Location::Header, kind)
    }

    pub fn cookie(name: &'static str, kind: Kind) -> Self {
        Self::new(name, Location::Cookie, kind)
    }

    /// Body field, or a member of a nested object schema.
    pub fn body(name: &'static str, kind: Kind) -> Self {
        Self::new(name, Location::Body, kind)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value substituted when the field is absent. Implies optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn min_length(self, n: usize) -> Self {
        self.constraint(Constraint::MinLength(n))
    }

    pub fn max_length(self, n: usize) -> Self {
        self.constraint(Constraint::MaxLength(n))
    }

    pub fn gt(self, bound: f64) -> Self {
        self.constraint(Constraint::Gt(bound))
    }

    pub fn ge(self, bound: f64) -> Self {
        self.constraint(Constraint::Ge(bound))
    }

    pub fn lt(self, bound: f64) -> Self {
        self.constraint(Constraint::Lt(bound))
    }

    pub fn le(self, bound: f64) -> Self {
        self.constraint(Constraint::Le(bound))
    }

    /// Regular-expression constraint.
    ///
    /// Patterns are part of static schema declarations, so an invalid
    /// pattern is a programming error and panics.
    pub fn pattern(self, pattern: &str) -> Self {
        let re = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern `{pattern}`: {e}"));
        self.constraint(Constraint::Pattern(re))
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Still accepted; only surfaced in documentation metadata.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Match the header name exactly as written (no `_` to `-` conversion).
    pub fn literal_name(mut self) -> Self {
        self.convert_underscores = false;
        self
    }

    /// Expect a single body field nested under its own name.
    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    pub fn title(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn is_embedded(&self) -> bool {
        self.embed
    }

    pub fn doc_title(&self) -> Option<&'static str> {
        self.title
    }

    pub fn doc_description(&self) -> Option<&'static str> {
        self.description
    }

    /// Name the value is looked up by on the wire.
    pub fn wire_name(&self) -> Cow<'static, str> {
        if self.location == Location::Header && self.convert_underscores {
            Cow::Owned(self.name.replace('_', "-"))
        } else {
            Cow::Borrowed(self.name)
        }
    }
}
