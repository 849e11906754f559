//! The uniform validator: presence, then coercion, then constraints.

use serde_json::{Map, Value};

use crate::coerce::{self, Rejection};
use crate::error::{ErrorKind, FieldError, LocSegment, ValidationErrors};
use crate::field::{Field, Kind, Location};
use crate::input::RawInput;
use crate::schema::Schema;

type Loc = Vec<LocSegment>;

pub(crate) fn validate_request(
    schema: &Schema,
    input: &RawInput,
) -> Result<Map<String, Value>, ValidationErrors> {
    let mut out = Map::new();
    let mut errors = ValidationErrors::new();

    let bare_body = schema.has_bare_body();
    // A wrapped body must be an object keyed by field name.
    let wrapped_body = match input.body() {
        Some(Value::Object(map)) if !bare_body => Some(map),
        Some(other) if !bare_body && !other.is_null() && schema.body_fields().next().is_some() => {
            let (kind, msg) = coerce::rejection(ErrorKind::Object);
            errors.push(FieldError::new(vec!["body".into()], kind, msg));
            None
        }
        _ => None,
    };

    for field in schema.fields() {
        let name = field.name();
        let mut loc: Loc = vec![field.location().as_str().into()];
        let result = match field.location() {
            Location::Path => from_text(field, input.path_value(name).into_iter().collect(), loc_with(loc, name)),
            Location::Query => from_text(field, input.query_values(name), loc_with(loc, name)),
            Location::Header => {
                from_text(field, input.header_values(&field.wire_name()), loc_with(loc, name))
            }
            Location::Cookie => from_text(field, input.cookie_value(name).into_iter().collect(), loc_with(loc, name)),
            Location::Body if bare_body => from_json(field, input.body(), loc),
            Location::Body => {
                loc.push(name.into());
                from_json(field, wrapped_body.and_then(|b| b.get(name)), loc)
            }
        };

        match result {
            Ok(value) => {
                out.insert(name.to_string(), value);
            }
            Err(field_errors) => errors.extend(field_errors),
        }
    }

    if errors.is_empty() { Ok(out) } else { Err(errors) }
}

fn loc_with(mut loc: Loc, segment: impl Into<LocSegment>) -> Loc {
    loc.push(segment.into());
    loc
}

fn reject(loc: Loc, (kind, msg): Rejection) -> Vec<FieldError> {
    vec![FieldError::new(loc, kind, msg)]
}

/// Presence check for a field that was not supplied at all.
fn absent(field: &Field, loc: Loc) -> Result<Value, Vec<FieldError>> {
    if let Some(default) = field.default_value() {
        Ok(default.clone())
    } else if field.is_required() {
        Err(reject(loc, coerce::rejection(ErrorKind::Missing)))
    } else {
        Ok(Value::Null)
    }
}

fn check_constraints(field_constraints: &[crate::field::Constraint], value: Value, loc: &Loc) -> Result<Value, Vec<FieldError>> {
    for constraint in field_constraints {
        if let Err(rejection) = constraint.check(&value) {
            return Err(reject(loc.clone(), rejection));
        }
    }
    Ok(value)
}

/// Values that arrived as text. Sequence kinds take every occurrence;
/// scalar kinds take the last one.
fn from_text(field: &Field, values: Vec<&str>, loc: Loc) -> Result<Value, Vec<FieldError>> {
    if values.is_empty() {
        return absent(field, loc);
    }

    match field.kind() {
        Kind::List(inner) | Kind::Set(inner) => {
            let mut items = Vec::with_capacity(values.len());
            let mut errors = Vec::new();
            for (i, raw) in values.into_iter().enumerate() {
                let item_loc = loc_with(loc.clone(), i);
                match coerce::from_text(inner, raw)
                    .map_err(|r| reject(item_loc.clone(), r))
                    .and_then(|v| check_constraints(field.constraints(), v, &item_loc))
                {
                    Ok(v) => items.push(v),
                    Err(e) => errors.extend(e),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Ok(finish_sequence(field.kind(), items))
        }
        scalar => {
            let raw = values.last().copied().unwrap_or_default();
            let value = coerce::from_text(scalar, raw).map_err(|r| reject(loc.clone(), r))?;
            check_constraints(field.constraints(), value, &loc)
        }
    }
}

fn from_json(field: &Field, raw: Option<&Value>, loc: Loc) -> Result<Value, Vec<FieldError>> {
    match raw {
        None => absent(field, loc),
        Some(Value::Null) if field.is_required() => {
            Err(reject(loc, coerce::rejection(ErrorKind::NoneNotAllowed)))
        }
        Some(Value::Null) => Ok(field.default_value().cloned().unwrap_or(Value::Null)),
        Some(value) => check_json(field.kind(), field.constraints(), value, loc),
    }
}

fn check_json(
    kind: &Kind,
    constraints: &[crate::field::Constraint],
    value: &Value,
    loc: Loc,
) -> Result<Value, Vec<FieldError>> {
    match kind {
        Kind::List(inner) | Kind::Set(inner) => {
            let Some(array) = value.as_array() else {
                return Err(reject(loc, coerce::rejection(ErrorKind::List)));
            };
            let mut items = Vec::with_capacity(array.len());
            let mut errors = Vec::new();
            for (i, element) in array.iter().enumerate() {
                match check_json(inner, constraints, element, loc_with(loc.clone(), i)) {
                    Ok(v) => items.push(v),
                    Err(e) => errors.extend(e),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            Ok(finish_sequence(kind, items))
        }
        Kind::Object(schema) => {
            let Some(map) = value.as_object() else {
                return Err(reject(loc, coerce::rejection(ErrorKind::Object)));
            };
            validate_object(schema, map, &loc)
        }
        scalar => {
            let coerced = coerce::from_json(scalar, value).map_err(|r| reject(loc.clone(), r))?;
            check_constraints(constraints, coerced, &loc)
        }
    }
}

/// Nested models keep declared members only; unknown keys are dropped.
fn validate_object(
    schema: &Schema,
    map: &Map<String, Value>,
    loc: &Loc,
) -> Result<Value, Vec<FieldError>> {
    let mut out = Map::new();
    let mut errors = Vec::new();
    for member in schema.fields() {
        let member_loc = loc_with(loc.clone(), member.name());
        match from_json(member, map.get(member.name()), member_loc) {
            Ok(v) => {
                out.insert(member.name().to_string(), v);
            }
            Err(e) => errors.extend(e),
        }
    }
    if errors.is_empty() { Ok(Value::Object(out)) } else { Err(errors) }
}

fn finish_sequence(kind: &Kind, mut items: Vec<Value>) -> Value {
    if matches!(kind, Kind::Set(_)) {
        let mut seen: Vec<Value> = Vec::with_capacity(items.len());
        items.retain(|v| {
            if seen.contains(v) {
                false
            } else {
                seen.push(v.clone());
                true
            }
        });
    }
    Value::Array(items)
}
