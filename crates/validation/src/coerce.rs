//! Coercion of raw text / JSON into the declared primitive kinds.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Number, Value};

use crate::error::ErrorKind;
use crate::field::Kind;

pub(crate) type Rejection = (ErrorKind, String);

/// Coerce a value that arrived as text (path, query, header, cookie).
pub(crate) fn from_text(kind: &Kind, raw: &str) -> Result<Value, Rejection> {
    match kind {
        Kind::Int => parse_int(raw),
        Kind::Float => parse_float(raw),
        Kind::Str => Ok(Value::String(raw.to_string())),
        Kind::Bool => parse_bool(raw),
        Kind::Enum(members) => parse_enum(members, raw),
        Kind::Url => parse_url(raw),
        Kind::DateTime => parse_datetime(raw),
        Kind::List(_) | Kind::Set(_) => Err(rejection(ErrorKind::List)),
        Kind::Object(_) => Err(rejection(ErrorKind::Object)),
    }
}

/// Coerce a scalar that arrived inside a JSON body.
///
/// Numbers may also be given as numeric strings; strings are never
/// produced from non-string JSON.
pub(crate) fn from_json(kind: &Kind, value: &Value) -> Result<Value, Rejection> {
    match (kind, value) {
        (Kind::Int, Value::Number(n)) => n
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| rejection(ErrorKind::Integer)),
        (Kind::Int, Value::String(s)) => parse_int(s),
        (Kind::Int, _) => Err(rejection(ErrorKind::Integer)),

        (Kind::Float, Value::Number(n)) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| rejection(ErrorKind::Float)),
        (Kind::Float, Value::String(s)) => parse_float(s),
        (Kind::Float, _) => Err(rejection(ErrorKind::Float)),

        (Kind::Bool, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (Kind::Bool, Value::String(s)) => parse_bool(s),
        (Kind::Bool, _) => Err(rejection(ErrorKind::Bool)),

        (Kind::Str | Kind::Enum(_) | Kind::Url | Kind::DateTime, Value::String(s)) => {
            from_text(kind, s)
        }
        (Kind::Str, _) => Err(rejection(ErrorKind::Str)),
        (Kind::Enum(members), _) => Err(enum_rejection(members)),
        (Kind::Url, _) => Err(rejection(ErrorKind::Url)),
        (Kind::DateTime, _) => Err(rejection(ErrorKind::DateTime)),

        (Kind::List(_) | Kind::Set(_), _) => Err(rejection(ErrorKind::List)),
        (Kind::Object(_), _) => Err(rejection(ErrorKind::Object)),
    }
}

pub(crate) fn rejection(kind: ErrorKind) -> Rejection {
    let msg = match kind {
        ErrorKind::Missing => "field required",
        ErrorKind::NoneNotAllowed => "none is not an allowed value",
        ErrorKind::Integer => "value is not a valid integer",
        ErrorKind::Float => "value is not a valid float",
        ErrorKind::Bool => "value could not be parsed to a boolean",
        ErrorKind::Str => "str type expected",
        ErrorKind::Enum => "value is not a valid enumeration member",
        ErrorKind::Url => "invalid or missing URL scheme",
        ErrorKind::DateTime => "invalid datetime format",
        ErrorKind::List => "value is not a valid list",
        ErrorKind::Object => "value is not a valid dict",
        ErrorKind::JsonInvalid => "body is not valid JSON",
        ErrorKind::MinLength
        | ErrorKind::MaxLength
        | ErrorKind::Gt
        | ErrorKind::Ge
        | ErrorKind::Lt
        | ErrorKind::Le
        | ErrorKind::Pattern => "constraint not satisfied",
    };
    (kind, msg.to_string())
}

fn parse_int(raw: &str) -> Result<Value, Rejection> {
    raw.trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| rejection(ErrorKind::Integer))
}

fn parse_float(raw: &str) -> Result<Value, Rejection> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| rejection(ErrorKind::Float))
}

fn parse_bool(raw: &str) -> Result<Value, Rejection> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
        "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
        _ => Err(rejection(ErrorKind::Bool)),
    }
}

fn parse_enum(members: &[&str], raw: &str) -> Result<Value, Rejection> {
    if members.contains(&raw) {
        Ok(Value::String(raw.to_string()))
    } else {
        Err(enum_rejection(members))
    }
}

fn enum_rejection(members: &[&str]) -> Rejection {
    let permitted = members
        .iter()
        .map(|m| format!("'{m}'"))
        .collect::<Vec<_>>()
        .join(", ");
    (
        ErrorKind::Enum,
        format!("value is not a valid enumeration member; permitted: {permitted}"),
    )
}

fn parse_url(raw: &str) -> Result<Value, Rejection> {
    let url = url::Url::parse(raw.trim()).map_err(|_| rejection(ErrorKind::Url))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(Value::String(url.to_string())),
        "http" | "https" => Err((ErrorKind::Url, "URL host invalid".to_string())),
        _ => Err((ErrorKind::Url, "URL scheme not permitted".to_string())),
    }
}

/// Timestamps are emitted in canonical RFC 3339 form. A timestamp without an
/// offset is kept naive rather than assumed to be UTC.
fn parse_datetime(raw: &str) -> Result<Value, Rejection> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Value::String(dt.to_rfc3339()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Value::String(naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
        }
    }
    Err(rejection(ErrorKind::DateTime))
}
