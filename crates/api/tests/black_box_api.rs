use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde_json::{Value, json};

use sampler_api::{AppConfig, app::AppServices, build_app};
use sampler_auth::JwtClaims;
use sampler_infra::InMemoryStore;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: InMemoryStore,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let store = InMemoryStore::new();
        let app = build_app(
            &AppConfig::new(JWT_SECRET),
            AppServices::in_memory(store.clone()),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: &str, disabled: bool) -> String {
    let now = Utc::now();
    let mut claims = JwtClaims::new(sub, now, now + ChronoDuration::minutes(10));
    claims.disabled = disabled;

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token() -> String {
    mint_jwt("johndoe", false)
}

async fn create_user(client: &reqwest::Client, srv: &TestServer, email: &str) -> reqwest::Response {
    client
        .post(srv.url("/users"))
        .bearer_auth(token())
        .json(&json!({ "email": email, "password": "secret" }))
        .send()
        .await
        .unwrap()
}

fn detail_paths(body: &Value) -> Vec<String> {
    body["detail"]
        .as_array()
        .expect("validation body has detail")
        .iter()
        .map(|d| {
            d["loc"]
                .as_array()
                .unwrap()
                .iter()
                .map(|s| match s {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect()
}

#[tokio::test]
async fn root_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Hello world" }));

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/users", "/items/items", "/others/items/1"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(res.headers()["www-authenticate"], "Bearer");
    }

    let res = client
        .get(srv.url("/users"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The gate runs before any session is taken.
    assert_eq!(srv.store.acquired_total(), 0);
}

#[tokio::test]
async fn inactive_user_is_forbidden() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/users"))
        .bearer_auth(mint_jwt("alice", true))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "inactive_user");
}

#[tokio::test]
async fn user_lifecycle_create_conflict_read() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = create_user(&client, &srv, "a@b.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["email"], "a@b.com");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["items"], json!([]));
    // Neither the raw credential nor the stored marker leaves the process.
    assert!(created.get("password").is_none());
    assert!(created.get("hashed_password").is_none());
    let id = created["id"].as_i64().unwrap();

    let res = create_user(&client, &srv, "a@b.com").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email already in use");

    let res = client
        .get(srv.url(&format!("/users/{id}")))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched, created);

    let res = client
        .get(srv.url("/users?skip=0&limit=10"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    let all: Value = res.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);

    assert_eq!(srv.store.open_sessions(), 0);
}

#[tokio::test]
async fn unknown_user_is_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/users/999999"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn path_ids_below_one_are_rejected_before_the_handler() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/users/0", "/users/-4", "/others/path_param_with_validation/0?q=x"] {
        let res = client.get(srv.url(path)).bearer_auth(token()).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["detail"][0]["type"], "value_error.number.not_ge");
    }

    let res = client
        .get(srv.url("/others/path_param_with_validation/3?q=x"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": 3, "q": "x" }));
}

#[tokio::test]
async fn item_price_must_be_positive() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let user: Value = create_user(&client, &srv, "owner@x.io").await.json().await.unwrap();
    let owner = user["id"].as_i64().unwrap();
    let url = srv.url(&format!("/items/{owner}/items"));

    for price in [0.0, -1.5] {
        let res = client
            .post(&url)
            .bearer_auth(token())
            .json(&json!({ "title": "Lamp", "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = res.json().await.unwrap();
        assert_eq!(detail_paths(&body), vec!["body.price"]);
    }

    let res = client
        .post(&url)
        .bearer_auth(token())
        .json(&json!({ "title": "Lamp", "description": "desk", "price": 9.99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["owner_id"], owner);
    assert_eq!(item["price"], 9.99);

    let items: Value = client
        .get(srv.url("/items/items"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items, json!([item]));

    let res = client
        .post(srv.url("/items/424242/items"))
        .bearer_auth(token())
        .json(&json!({ "title": "Lamp", "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(srv.store.open_sessions(), 0);
}

#[tokio::test]
async fn missing_required_fields_are_all_named() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/users"))
        .bearer_auth(token())
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_paths(&body), vec!["body.email", "body.password"]);
    assert_eq!(body["detail"][0]["type"], "value_error.missing");

    let res = client
        .get(srv.url("/others/required_query_param"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(detail_paths(&body), vec!["query.q"]);
}

#[tokio::test]
async fn pattern_query_accepts_only_the_fixed_value() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let url = srv.url("/others/query_param_with_validation");

    let res = client
        .get(format!("{url}?q=fixedquery"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["q"], "fixedquery");

    let res = client
        .get(format!("{url}?q=anythingelse"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"][0]["type"], "value_error.str.regex");

    let res = client.get(&url).bearer_auth(token()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("q").is_none());
    assert_eq!(body["items"][0]["item_id"], "Foo");
}

#[tokio::test]
async fn repeated_query_values_and_defaults() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(srv.url("/others/query_params_list?q=foo&q=bar"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "q": ["foo", "bar"] }));

    let body: Value = client
        .get(srv.url("/others/query_params_list"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "q": null }));

    let body: Value = client
        .get(srv.url("/others/query_params_list_with_defaults"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "q": ["foo", "bar"] }));
}

#[tokio::test]
async fn header_params() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(srv.url("/others/duplicate_headers"))
        .bearer_auth(token())
        .header("X-Token", "a")
        .header("X-Token", "b")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "X-Token values": ["a", "b"] }));

    let body: Value = client
        .get(srv.url("/others/header_param"))
        .bearer_auth(token())
        .header("User-Agent", "sampler-client/1.0")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "User-Agent": "sampler-client/1.0" }));

    // Bytes outside visible ASCII still count as a sent header.
    let body: Value = client
        .get(srv.url("/others/header_param"))
        .bearer_auth(token())
        .header("User-Agent", HeaderValue::from_bytes(b"caf\xe9/1.0").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "User-Agent": "caf\u{e9}/1.0" }));

    // Only the literal, underscored name matches.
    let body: Value = client
        .get(srv.url("/others/header_not_hyphen"))
        .bearer_auth(token())
        .header("strange-header", "hyphen")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "strange-header": null }));

    let body: Value = client
        .get(srv.url("/others/header_not_hyphen"))
        .bearer_auth(token())
        .header("strange_header", "underscore")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "strange-header": "underscore" }));
}

#[tokio::test]
async fn cookie_and_enum_params() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(srv.url("/others/cookie_param"))
        .bearer_auth(token())
        .header("Cookie", "ads_id=abc123; theme=dark")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "ads_id": "abc123" }));

    let body: Value = client
        .get(srv.url("/others/cookie_param"))
        .bearer_auth(token())
        .header("Cookie", "ads_id=old; ads_id=new")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "ads_id": "new" }));

    let res = client
        .get(srv.url("/others/models?model_name=lenet"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "model_name": "lenet" }));

    let res = client
        .get(srv.url("/others/models?model_name=LeNet"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn multi_and_embedded_bodies() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/others/items/5"))
        .bearer_auth(token())
        .json(&json!({
            "item": {
                "name": "Foo",
                "price": 35.4,
                "tags": ["x", "y", "x"],
                "images": [{"url": "http://example.com/a.png", "name": "A"}],
            },
            "user": {"name": "dave"},
            "importance": 5,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["item_id"], 5);
    assert_eq!(body["item"]["tags"], json!(["x", "y"]));
    assert_eq!(body["user"], json!({"name": "dave", "email": null, "phone": null}));
    assert_eq!(body["importance"], 5);

    let res = client
        .post(srv.url("/others/items/5"))
        .bearer_auth(token())
        .json(&json!({
            "item": {"name": "Foo", "price": 1.0, "images": [{"url": "not a url", "name": "A"}]},
            "user": {"name": "dave"},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        detail_paths(&body),
        vec!["body.item.images.0.url", "body.importance"]
    );

    let res = client
        .post(srv.url("/others/body_embedded"))
        .bearer_auth(token())
        .json(&json!({ "user": {"name": "erin", "email": "e@x.io"} }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "e@x.io");
}

#[tokio::test]
async fn response_model_hides_the_password() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/others/response_model"))
        .bearer_auth(token())
        .json(&json!({ "name": "foo", "email": "f@x.io", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "name": "foo",
            "email": "f@x.io",
            "phone": null,
            "hashed_password": "supersecretpw",
        })
    );

    let res = client
        .post(srv.url("/others/response_with_status_code?name=bob"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "name": "bob" }));
}

#[tokio::test]
async fn convert_to_jsonable_normalizes_timestamps() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url("/others/convert_to_jsonable/foo"))
        .bearer_auth(token())
        .json(&json!({ "title": "t", "timestamp": "2021-05-01T10:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "title": "t", "timestamp": "2021-05-01T10:00:00+00:00", "description": null })
    );

    let res = client
        .put(srv.url("/others/convert_to_jsonable/foo"))
        .bearer_auth(token())
        .json(&json!({ "title": "t", "timestamp": "yesterday" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unavailable_store_is_503_and_nothing_leaks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.store.set_available(false);

    let res = client
        .get(srv.url("/users"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_unavailable");

    srv.store.set_available(true);
    let res = create_user(&client, &srv, "back@x.io").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(srv.store.open_sessions(), 0);
}

#[tokio::test]
async fn sessions_are_released_on_every_path() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Success, conflict and not found each open a session; a validation
    // failure never gets that far.
    create_user(&client, &srv, "s@x.io").await;
    create_user(&client, &srv, "s@x.io").await;
    client
        .get(srv.url("/users/999999"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    client
        .get(srv.url("/users/0"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();

    assert_eq!(srv.store.acquired_total(), 3);
    assert_eq!(srv.store.open_sessions(), 0);
}

#[tokio::test]
async fn invalid_input_is_422_even_when_the_store_is_down() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.store.set_available(false);

    let res = client
        .get(srv.url("/users/0"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(detail_paths(&body), vec!["path.user_id"]);

    let res = client
        .get(srv.url("/users/1"))
        .bearer_auth(token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(srv.store.acquired_total(), 0);
}

#[tokio::test]
async fn blank_email_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = create_user(&client, &srv, "   ").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_paths(&body), vec!["body.email"]);
    assert_eq!(srv.store.acquired_total(), 0);
}

#[tokio::test]
async fn cors_preflight_for_allowed_origin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/users"))
        .header("Origin", "http://localhost:8080")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:8080");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/users"))
        .header("Origin", "http://evil.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn openapi_document_describes_routes() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/openapi.json")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    let paths = &body["paths"];

    let deprecated = &paths["/others/path_param_with_validation/{id}"]["get"];
    assert_eq!(deprecated["deprecated"], true);
    assert!(deprecated["security"].is_array());

    let created = &paths["/others/response_with_status_code"]["post"];
    assert!(created["responses"].get("201").is_some());

    assert!(paths["/"]["get"].get("security").is_none());
}
