use serde::Deserialize;

use sampler_infra::Page;
use sampler_validation::{Field, Kind, Schema};

use crate::app::extract::contract;

// -------------------------
// Shared
// -------------------------

/// `?skip=&limit=` paging.
#[derive(Debug, Deserialize)]
pub struct Paging {
    pub skip: u64,
    pub limit: u64,
}

contract!(Paging => vec![
    Field::query("skip", Kind::Int).default(0).ge(0.0),
    Field::query("limit", Kind::Int).default(Page::DEFAULT_LIMIT).ge(0.0),
]);

impl From<Paging> for Page {
    fn from(p: Paging) -> Self {
        Page::new(p.skip, p.limit)
    }
}

fn user_id_path() -> Field {
    Field::path("user_id", Kind::Int).ge(1.0).title("Id of the user")
}

// -------------------------
// Users
// -------------------------

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user: UserCreate,
}

contract!(CreateUserRequest => vec![
    Field::body("user", Kind::Object(Schema::new(vec![
        Field::body("email", Kind::Str).min_length(1).pattern(r"\S"),
        Field::body("password", Kind::Str),
    ]))),
]);

#[derive(Debug, Deserialize)]
pub struct UserPath {
    pub user_id: i64,
}

contract!(UserPath => vec![user_id_path()]);

// -------------------------
// Items
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub user_id: i64,
    pub item: ItemCreate,
}

contract!(CreateItemRequest => vec![
    user_id_path(),
    Field::body("item", Kind::Object(Schema::new(vec![
        Field::body("title", Kind::Str),
        Field::body("description", Kind::Str).optional(),
        Field::body("price", Kind::Float)
            .gt(0.0)
            .description("The price must be greater than 0"),
    ]))),
]);
