use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::openapi::path::HttpMethod;

use sampler_core::{NewItem, UserId};

use crate::app::dto::{CreateItemRequest, Paging};
use crate::app::errors::ApiError;
use crate::app::extract::{DbSession, Valid};
use crate::app::routes::RouteDoc;
use crate::app::shape::{ItemOut, shape, shape_all};
use crate::context::CurrentUser;

pub const PREFIX: &str = "/items";

pub fn router() -> Router {
    Router::new()
        .route("/items", get(read_items))
        .route("/:user_id/items", post(create_item_for_user))
}

pub fn docs() -> Vec<RouteDoc> {
    vec![
        RouteDoc::new("Items", HttpMethod::Get, PREFIX, "/items", "List items").input::<Paging>(),
        RouteDoc::new("Items", HttpMethod::Post, PREFIX, "/:user_id/items", "Create item for user")
            .input::<CreateItemRequest>(),
    ]
}

pub async fn read_items(
    session: DbSession,
    Valid(paging): Valid<Paging>,
) -> Result<Json<Vec<ItemOut>>, ApiError> {
    let mut db = session.open().await?;
    let items = db.list_items(paging.into()).await?;
    Ok(shape_all::<ItemOut>(&items))
}

pub async fn create_item_for_user(
    current: CurrentUser,
    session: DbSession,
    Valid(req): Valid<CreateItemRequest>,
) -> Result<Json<ItemOut>, ApiError> {
    let owner_id = UserId::new(req.user_id)?;
    let mut db = session.open().await?;
    if db.get_user(owner_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let new_item = NewItem::new(req.item.title, req.item.description, req.item.price)?;
    let item = db.create_user_item(owner_id, new_item).await?;

    tracing::info!(by = %current.username(), item_id = %item.id, owner_id = %owner_id, "item created");
    Ok(shape::<ItemOut>(&item))
}
