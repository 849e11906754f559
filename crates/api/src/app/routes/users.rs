use axum::{
    Json, Router,
    routing::get,
};
use utoipa::openapi::path::HttpMethod;

use sampler_core::{NewUser, UserId};
use sampler_infra::StoreError;

use crate::app::dto::{CreateUserRequest, Paging, UserPath};
use crate::app::errors::ApiError;
use crate::app::extract::{DbSession, Valid};
use crate::app::routes::RouteDoc;
use crate::app::shape::{UserOut, shape, shape_all};
use crate::context::CurrentUser;

pub const PREFIX: &str = "/users";

const EMAIL_IN_USE: &str = "Email already in use";
const USER_NOT_FOUND: &str = "User not found";

pub fn router() -> Router {
    Router::new()
        .route("/", get(read_users).post(create_user))
        .route("/:user_id", get(read_user))
}

pub fn docs() -> Vec<RouteDoc> {
    vec![
        RouteDoc::new("Users", HttpMethod::Post, PREFIX, "", "Create user").input::<CreateUserRequest>(),
        RouteDoc::new("Users", HttpMethod::Get, PREFIX, "", "List users").input::<Paging>(),
        RouteDoc::new("Users", HttpMethod::Get, PREFIX, "/:user_id", "Read user").input::<UserPath>(),
    ]
}

pub async fn create_user(
    current: CurrentUser,
    session: DbSession,
    Valid(req): Valid<CreateUserRequest>,
) -> Result<Json<UserOut>, ApiError> {
    let mut db = session.open().await?;
    if db.get_user_by_email(&req.user.email).await?.is_some() {
        return Err(ApiError::Conflict(EMAIL_IN_USE.to_string()));
    }

    let new_user = NewUser::register(req.user.email, &req.user.password)?;

    // A concurrent insert of the same email loses on the unique index.
    let user = db.create_user(new_user).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::Conflict(EMAIL_IN_USE.to_string()),
        other => other.into(),
    })?;

    tracing::info!(by = %current.username(), user_id = %user.id, "user created");
    Ok(shape::<UserOut>(&user))
}

pub async fn read_users(
    session: DbSession,
    Valid(paging): Valid<Paging>,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    let mut db = session.open().await?;
    let users = db.list_users(paging.into()).await?;
    Ok(shape_all::<UserOut>(&users))
}

pub async fn read_user(
    session: DbSession,
    Valid(path): Valid<UserPath>,
) -> Result<Json<UserOut>, ApiError> {
    let user_id = UserId::new(path.user_id)?;
    let mut db = session.open().await?;
    let user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(shape::<UserOut>(&user))
}
