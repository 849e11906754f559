//! Parameter-handling showcase: one endpoint per way of declaring input.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::openapi::path::HttpMethod;

use sampler_infra::KeyValueStore;
use sampler_validation::{Field, Kind, Schema};

use crate::app::errors::ApiError;
use crate::app::extract::{Valid, contract};
use crate::app::routes::RouteDoc;
use crate::app::services::AppServices;
use crate::app::shape::{OutputShape, Timestamp, shape, to_jsonable};

pub const PREFIX: &str = "/others";

const TAG: &str = "Others";

/// Salt prepended by the demo credential marker.
const FAKE_SALT: &str = "supersecret";

pub fn router() -> Router {
    Router::new()
        .route("/items/:item_id", get(read_item).post(create_item))
        .route("/models", get(get_model))
        .route("/body_embedded", post(body_embedded))
        .route("/query_param_with_validation", get(query_param_with_validation))
        .route("/required_query_param", get(required_query_param))
        .route("/query_params_list", get(query_params_list))
        .route("/query_params_list_with_defaults", get(query_params_list_with_defaults))
        .route("/path_param_with_validation/:id", get(path_param_with_validation))
        .route("/cookie_param", get(cookie_param))
        .route("/header_param", get(header_param))
        .route("/header_not_hyphen", get(header_not_hyphen))
        .route("/duplicate_headers", get(duplicate_headers))
        .route("/response_model", post(response_model))
        .route("/response_with_status_code", post(response_with_status_code))
        .route("/convert_to_jsonable/:item_id", put(convert_to_jsonable))
}

pub fn docs() -> Vec<RouteDoc> {
    let doc = |method, path, summary| RouteDoc::new(TAG, method, PREFIX, path, summary);
    vec![
        doc(HttpMethod::Get, "/items/:item_id", "Read item").input::<ItemIdPath>(),
        doc(HttpMethod::Get, "/models", "Get model").input::<ModelQuery>(),
        doc(HttpMethod::Post, "/items/:item_id", "Create item with user").input::<ItemWithUser>(),
        doc(HttpMethod::Post, "/body_embedded", "Embedded body").input::<EmbeddedUser>(),
        doc(HttpMethod::Get, "/query_param_with_validation", "Query with pattern").input::<PatternQuery>(),
        doc(HttpMethod::Get, "/required_query_param", "Required query").input::<RequiredQuery>(),
        doc(HttpMethod::Get, "/query_params_list", "Repeated query").input::<ListQuery>(),
        doc(HttpMethod::Get, "/query_params_list_with_defaults", "Repeated query with defaults")
            .input::<ListQueryWithDefaults>(),
        doc(HttpMethod::Get, "/path_param_with_validation/:id", "Path with bounds").input::<BoundedPath>(),
        doc(HttpMethod::Get, "/cookie_param", "Cookie").input::<AdsCookie>(),
        doc(HttpMethod::Get, "/header_param", "Header").input::<UserAgentHeader>(),
        doc(HttpMethod::Get, "/header_not_hyphen", "Header with literal name")
            .description("Will not convert underscores to hyphens, as is common for header parameters")
            .input::<StrangeHeader>(),
        doc(HttpMethod::Get, "/duplicate_headers", "Repeated header")
            .description("Can receive multiple values for a header")
            .input::<TokenHeaders>(),
        doc(HttpMethod::Post, "/response_model", "Response model").input::<UserInBody>(),
        doc(HttpMethod::Post, "/response_with_status_code", "Custom status code")
            .status(201)
            .input::<NameQuery>(),
        doc(HttpMethod::Put, "/convert_to_jsonable/:item_id", "Store JSON-compatible item")
            .input::<TimestampedItemBody>(),
    ]
}

// -------------------------
// Body models
// -------------------------

fn image_model() -> Kind {
    Kind::Object(Schema::new(vec![
        Field::body("url", Kind::Url),
        Field::body("name", Kind::Str),
    ]))
}

fn item_model() -> Kind {
    Kind::Object(Schema::new(vec![
        Field::body("name", Kind::Str),
        Field::body("description", Kind::Str)
            .optional()
            .max_length(300)
            .title("The description of the item"),
        Field::body("price", Kind::Float)
            .gt(0.0)
            .description("The price must be greater than 0"),
        Field::body("tax", Kind::Float).optional(),
        Field::body("tags", Kind::set(Kind::Str)).default(json!([])),
        Field::body("images", Kind::list(image_model())).optional(),
    ]))
}

fn user_base_fields() -> Vec<Field> {
    vec![
        Field::body("name", Kind::Str),
        Field::body("email", Kind::Str).optional(),
        Field::body("phone", Kind::Str).optional(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub tax: Option<f64>,
    pub tags: Vec<String>,
    pub images: Option<Vec<Image>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBase {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserIn {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

/// What `/response_model` may return: the public fields plus the marker.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hashed_password: String,
}

impl OutputShape for UserOut {
    type Source = UserIn;

    fn project(user: &UserIn) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            hashed_password: fake_password_hasher(&user.password),
        }
    }
}

/// Demonstration only; not a hash.
fn fake_password_hasher(raw: &str) -> String {
    format!("{FAKE_SALT}{raw}")
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimestampedItem {
    pub title: String,
    pub timestamp: Timestamp,
    pub description: Option<String>,
}

// -------------------------
// Contracts
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ItemIdPath {
    pub item_id: i64,
}

contract!(ItemIdPath => vec![Field::path("item_id", Kind::Int)]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelName {
    #[serde(rename = "new_test_value")]
    NewTestValue,
    #[serde(rename = "lenet")]
    Lenet,
}

impl ModelName {
    pub const ALL: &'static [&'static str] = &["new_test_value", "lenet"];
}

#[derive(Debug, Deserialize)]
pub struct ModelQuery {
    pub model_name: ModelName,
}

contract!(ModelQuery => vec![Field::query("model_name", Kind::Enum(ModelName::ALL))]);

#[derive(Debug, Deserialize)]
pub struct ItemWithUser {
    pub item_id: i64,
    pub item: DemoItem,
    pub user: UserBase,
    pub importance: i64,
}

contract!(ItemWithUser => vec![
    Field::path("item_id", Kind::Int),
    Field::body("item", item_model()),
    Field::body("user", Kind::Object(Schema::new(user_base_fields()))),
    Field::body("importance", Kind::Int),
]);

#[derive(Debug, Deserialize)]
pub struct EmbeddedUser {
    pub user: UserBase,
}

contract!(EmbeddedUser => vec![
    Field::body("user", Kind::Object(Schema::new(user_base_fields()))).embed(),
]);

#[derive(Debug, Deserialize)]
pub struct PatternQuery {
    pub q: Option<String>,
}

contract!(PatternQuery => vec![
    Field::query("q", Kind::Str).optional().max_length(50).pattern("^fixedquery$"),
]);

#[derive(Debug, Deserialize)]
pub struct RequiredQuery {
    pub q: String,
}

contract!(RequiredQuery => vec![Field::query("q", Kind::Str).max_length(50)]);

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<Vec<String>>,
}

contract!(ListQuery => vec![Field::query("q", Kind::list(Kind::Str)).optional()]);

#[derive(Debug, Deserialize)]
pub struct ListQueryWithDefaults {
    pub q: Vec<String>,
}

contract!(ListQueryWithDefaults => vec![
    Field::query("q", Kind::list(Kind::Str)).default(json!(["foo", "bar"])),
]);

#[derive(Debug, Deserialize)]
pub struct BoundedPath {
    pub id: i64,
    pub q: String,
}

contract!(BoundedPath => vec![
    Field::path("id", Kind::Int).ge(1.0).deprecated().title("Id of item to get"),
    Field::query("q", Kind::Str),
]);

#[derive(Debug, Deserialize)]
pub struct AdsCookie {
    pub ads_id: Option<String>,
}

contract!(AdsCookie => vec![Field::cookie("ads_id", Kind::Str).optional()]);

#[derive(Debug, Deserialize)]
pub struct UserAgentHeader {
    pub user_agent: Option<String>,
}

contract!(UserAgentHeader => vec![Field::header("user_agent", Kind::Str).optional()]);

#[derive(Debug, Deserialize)]
pub struct StrangeHeader {
    pub strange_header: Option<String>,
}

contract!(StrangeHeader => vec![
    Field::header("strange_header", Kind::Str).optional().literal_name(),
]);

#[derive(Debug, Deserialize)]
pub struct TokenHeaders {
    pub x_token: Option<Vec<String>>,
}

contract!(TokenHeaders => vec![Field::header("x_token", Kind::list(Kind::Str)).optional()]);

#[derive(Debug, Deserialize)]
pub struct UserInBody {
    pub user: UserIn,
}

contract!(UserInBody => vec![
    Field::body("user", Kind::Object(Schema::new({
        let mut fields = user_base_fields();
        fields.push(Field::body("password", Kind::Str));
        fields
    }))),
]);

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

contract!(NameQuery => vec![Field::query("name", Kind::Str)]);

#[derive(Debug, Deserialize)]
pub struct TimestampedItemBody {
    pub item_id: String,
    pub item: TimestampedItem,
}

contract!(TimestampedItemBody => vec![
    Field::path("item_id", Kind::Str),
    Field::body("item", Kind::Object(Schema::new(vec![
        Field::body("title", Kind::Str),
        Field::body("timestamp", Kind::DateTime),
        Field::body("description", Kind::Str).optional(),
    ]))),
]);

// -------------------------
// Handlers
// -------------------------

fn fake_items(q: Option<String>) -> Value {
    let mut results = json!({ "items": [{"item_id": "Foo"}, {"item_id": "Bar"}] });
    if let (Some(q), Some(map)) = (q.filter(|q| !q.is_empty()), results.as_object_mut()) {
        map.insert("q".to_string(), Value::String(q));
    }
    results
}

pub async fn read_item(Valid(path): Valid<ItemIdPath>) -> Json<Value> {
    Json(json!({ "item_id": path.item_id }))
}

pub async fn get_model(Valid(query): Valid<ModelQuery>) -> Json<Value> {
    Json(json!({ "model_name": query.model_name }))
}

pub async fn create_item(Valid(req): Valid<ItemWithUser>) -> Json<Value> {
    Json(json!({
        "item_id": req.item_id,
        "item": req.item,
        "user": req.user,
        "importance": req.importance,
    }))
}

pub async fn body_embedded(Valid(req): Valid<EmbeddedUser>) -> Json<Value> {
    Json(json!({ "user": req.user }))
}

pub async fn query_param_with_validation(Valid(query): Valid<PatternQuery>) -> Json<Value> {
    Json(fake_items(query.q))
}

pub async fn required_query_param(Valid(query): Valid<RequiredQuery>) -> Json<Value> {
    Json(fake_items(Some(query.q)))
}

pub async fn query_params_list(Valid(query): Valid<ListQuery>) -> Json<Value> {
    Json(json!({ "q": query.q }))
}

pub async fn query_params_list_with_defaults(Valid(query): Valid<ListQueryWithDefaults>) -> Json<Value> {
    Json(json!({ "q": query.q }))
}

pub async fn path_param_with_validation(Valid(req): Valid<BoundedPath>) -> Json<Value> {
    let mut results = json!({ "id": req.id });
    if !req.q.is_empty() {
        results["q"] = Value::String(req.q);
    }
    Json(results)
}

pub async fn cookie_param(Valid(req): Valid<AdsCookie>) -> Json<Value> {
    Json(json!({ "ads_id": req.ads_id }))
}

pub async fn header_param(Valid(req): Valid<UserAgentHeader>) -> Json<Value> {
    Json(json!({ "User-Agent": req.user_agent }))
}

pub async fn header_not_hyphen(Valid(req): Valid<StrangeHeader>) -> Json<Value> {
    Json(json!({ "strange-header": req.strange_header }))
}

pub async fn duplicate_headers(Valid(req): Valid<TokenHeaders>) -> Json<Value> {
    Json(json!({ "X-Token values": req.x_token }))
}

pub async fn response_model(Valid(req): Valid<UserInBody>) -> Json<UserOut> {
    shape::<UserOut>(&req.user)
}

pub async fn response_with_status_code(Valid(req): Valid<NameQuery>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "name": req.name })))
}

pub async fn convert_to_jsonable(
    Extension(services): Extension<Arc<AppServices>>,
    Valid(req): Valid<TimestampedItemBody>,
) -> Result<Json<Value>, ApiError> {
    let jsonable = to_jsonable(&req.item)?;
    services.demo.put(&req.item_id, jsonable.clone());
    Ok(Json(jsonable))
}

#[cfg(test)]
mod tests {
    use sampler_validation::RawInput;

    use super::*;
    use crate::app::extract::Contract;

    #[test]
    fn marker_is_salted_password() {
        let user = UserIn {
            name: "Foo".into(),
            email: None,
            phone: None,
            password: "pw".into(),
        };
        let out = serde_json::to_value(UserOut::project(&user)).unwrap();
        assert_eq!(out["hashed_password"], "supersecretpw");
        assert!(out.get("password").is_none());
    }

    #[test]
    fn enum_query_rejects_unknown_members() {
        let err = ModelQuery::schema()
            .validate(&RawInput::new().with_query("model_name", "resnet"))
            .unwrap_err();
        assert!(err.has_path("query.model_name"));

        let ok = ModelQuery::schema()
            .validate(&RawInput::new().with_query("model_name", "lenet"))
            .unwrap();
        let query: ModelQuery = serde_json::from_value(Value::Object(ok)).unwrap();
        assert_eq!(query.model_name, ModelName::Lenet);
    }

    #[test]
    fn fake_items_only_echo_non_empty_q() {
        assert!(fake_items(None).get("q").is_none());
        assert!(fake_items(Some(String::new())).get("q").is_none());
        assert_eq!(fake_items(Some("fixedquery".into()))["q"], "fixedquery");
    }

    #[test]
    fn multi_body_tags_are_deduplicated() {
        let input = RawInput::new().with_path("item_id", "5").with_body(json!({
            "item": {"name": "Foo", "price": 1.0, "tags": ["a", "b", "a"]},
            "user": {"name": "Dave"},
            "importance": 5,
        }));
        let values = ItemWithUser::schema().validate(&input).unwrap();
        let req: ItemWithUser = serde_json::from_value(Value::Object(values)).unwrap();
        assert_eq!(req.item.tags, vec!["a", "b"]);
        assert_eq!(req.user.name, "Dave");
        assert_eq!(req.importance, 5);
    }
}
