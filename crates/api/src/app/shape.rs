//! Response shaping.
//!
//! Handlers never serialize stored records directly. Each response contract
//! is a struct listing exactly the fields that may leave the process, built
//! from its source through [`OutputShape::project`]. A field missing from the
//! struct cannot be serialized, whatever the handler does.

use axum::Json;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use sampler_core::{Item, User};

use crate::app::errors::ApiError;

pub trait OutputShape: Serialize + Sized {
    type Source;

    fn project(source: &Self::Source) -> Self;
}

pub fn shape<O: OutputShape>(source: &O::Source) -> Json<O> {
    Json(O::project(source))
}

pub fn shape_all<O: OutputShape>(sources: &[O::Source]) -> Json<Vec<O>> {
    Json(sources.iter().map(O::project).collect())
}

/// Convert any serializable value into plain JSON data (strings, numbers,
/// arrays, objects), e.g. before storing it somewhere that only holds JSON.
pub fn to_jsonable<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(format!("not representable as JSON: {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOut {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub owner_id: i64,
}

impl OutputShape for ItemOut {
    type Source = Item;

    fn project(item: &Item) -> Self {
        Self {
            id: item.id.get(),
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price,
            owner_id: item.owner_id.get(),
        }
    }
}

/// Public view of a user. The stored credential is not a member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub items: Vec<ItemOut>,
}

impl OutputShape for UserOut {
    type Source = User;

    fn project(user: &User) -> Self {
        Self {
            id: user.id.get(),
            email: user.email.clone(),
            is_active: user.is_active,
            items: user.items.iter().map(ItemOut::project).collect(),
        }
    }
}

/// A point in time, with or without a UTC offset, rendered as ISO 8601.
///
/// Offsets are always written numerically (`+00:00`, never `Z`), the same
/// form the validator hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timestamp::Zoned(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Timestamp::Naive(dt) => serializer.collect_str(&dt.format(NAIVE_FORMAT)),
        }
    }
}
