use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use reaction_core::db::open_db;
use reaction_core::{
    ContentTier, IdentityId, ItemCheckPolicy, ItemId, LedgerPolicy, SqliteContentRegistry,
    TokenTableIdentityProvider,
};
use reaction_server::router::build_router;
use reaction_server::AppState;
use serde_json::{json, Value};
use tower::util::ServiceExt;

struct TestServer {
    _dir: tempfile::TempDir,
    app: Router,
}

fn server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reactions.db");

    let conn = open_db(&path).unwrap();
    let registry = SqliteContentRegistry::new(&conn);
    for raw in ["1", "2", "3", "42"] {
        registry
            .register_item(&ItemId::parse(raw).unwrap(), ContentTier::Free)
            .unwrap();
    }
    drop(conn);

    let identities = [("token-u1", "u1"), ("token-u2", "u2")]
        .into_iter()
        .map(|(token, raw)| (token.to_string(), IdentityId::parse(raw).unwrap()))
        .collect::<TokenTableIdentityProvider>();
    let policy = LedgerPolicy {
        item_check: ItemCheckPolicy::Strict,
        ..LedgerPolicy::default()
    };

    TestServer {
        app: build_router(AppState::new(path, identities, policy)),
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_endpoint() {
    let server = server();
    let (status, body) = send(&server.app, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn react_then_switch_then_conflict() {
    let server = server();
    let app = &server.app;

    let (status, body) = send(
        app,
        post("/v1/reactions", Some("token-u1"), json!({"itemId": "42", "emoji": "love"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "count": 1, "outcome": "created"}));

    let (status, _) = send(
        app,
        post("/v1/reactions", Some("token-u1"), json!({"itemId": "42", "emoji": "love"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        app,
        post("/v1/reactions", Some("token-u1"), json!({"itemId": "42", "emoji": "cool"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "switched");

    let (status, body) = send(app, get("/v1/counts?itemId=42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cool": 1, "love": 0}));
}

#[tokio::test]
async fn react_requires_known_bearer_token() {
    let server = server();
    let body = json!({"itemId": "42", "emoji": "love"});

    let (status, _) = send(&server.app, post("/v1/reactions", None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&server.app, post("/v1/reactions", Some("nope"), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let server = server();

    let (status, body) = send(
        &server.app,
        post("/v1/reactions", Some("token-u1"), json!({"emoji": "love"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &server.app,
        post("/v1/reactions", Some("token-u1"), json!({"itemId": "404", "emoji": "love"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/reactions")
        .header("content-type", "application/json")
        .header("authorization", "Bearer token-u1")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bulk_reaction_is_all_or_nothing() {
    let server = server();
    let app = &server.app;
    send(
        app,
        post("/v1/reactions", Some("token-u2"), json!({"itemId": "2", "emoji": "love"})),
    )
    .await;

    let (status, body) = send(
        app,
        post(
            "/v1/reactions/bulk",
            Some("token-u2"),
            json!({"itemIds": ["1", "2", "3"], "emoji": "love"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "already reacted"}));

    let (_, counts) = send(app, get("/v1/counts?itemId=1")).await;
    assert_eq!(counts, json!({}));

    let (status, body) = send(
        app,
        post(
            "/v1/reactions/bulk",
            Some("token-u1"),
            json!({"itemIds": ["1", "2", "3"], "emoji": "love"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][1], json!({"itemId": "2", "count": 2}));
}

#[tokio::test]
async fn reaction_lookup_and_leaderboard() {
    let server = server();
    let app = &server.app;
    for (token, item, emoji) in [
        ("token-u1", "42", "love"),
        ("token-u2", "42", "love"),
        ("token-u1", "1", "cool"),
    ] {
        send(
            app,
            post("/v1/reactions", Some(token), json!({"itemId": item, "emoji": emoji})),
        )
        .await;
    }

    let (status, body) = send(app, get("/v1/reactions/love/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"emoji": "love", "itemId": "42", "count": 2}));

    let (status, body) = send(app, get("/v1/reactions/cool/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "reaction not found"}));

    let (status, body) = send(app, get("/v1/counts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"itemId": "42", "emoji": "love", "count": 2},
            {"itemId": "1", "emoji": "cool", "count": 1},
        ])
    );
}
