#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use projecthub_api::auth::jwt::{generate_access_token, JwtConfig};
use projecthub_api::auth::password::hash_password;
use projecthub_api::config::ServerConfig;
use projecthub_api::router::build_app_router;
use projecthub_api::state::AppState;
use projecthub_api::ws::WsManager;
use projecthub_db::models::user::{CreateUser, User};
use projecthub_db::repositories::UserRepo;

/// Password given to every seeded user.
pub const TEST_PASSWORD: &str = "test_password_123";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:3000` as CORS origin and fixed JWT secrets so
/// tests can mint their own tokens.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        upload_dir: std::env::temp_dir().join("projecthub-test-uploads"),
        max_file_size: 5 * 1024 * 1024,
        notify_member_added: true,
        notification_purge_interval_hours: None,
        notification_retention_days: 30,
        reminder_interval_secs: 3600,
        jwt: JwtConfig {
            secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 1,
        },
    }
}

/// Build shared state around `pool` with a fresh connection manager.
pub fn test_state(pool: PgPool, config: ServerConfig) -> AppState {
    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(test_state(pool, config.clone()), &config)
}

/// Like [`build_test_app`] but also hands back the state, so tests can
/// register live connections on its `WsManager`.
pub fn build_test_app_with_state(pool: PgPool) -> (Router, AppState) {
    build_test_app_with_config(pool, test_config())
}

/// Build the router around a custom config (e.g. a temp upload dir).
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> (Router, AppState) {
    let state = test_state(pool, config.clone());
    (build_app_router(state.clone(), &config), state)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Insert a user directly and return it with a valid access token.
pub async fn seed_user(pool: &PgPool, username: &str, role: &str) -> (User, String) {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        full_name: format!("{username} Tester"),
        role: role.to_string(),
        major: None,
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    let token = generate_access_token(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

/// Create a project through the API and return its JSON (`data` unwrapped).
pub async fn create_project(
    app: Router,
    token: &str,
    name: &str,
    members: &[i64],
) -> serde_json::Value {
    let body = serde_json::json!({ "name": name, "members": members });
    let response = post_json_auth(app, "/api/projects", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Create a task through the API and return its JSON (`data` unwrapped).
pub async fn create_task(
    app: Router,
    token: &str,
    project_id: i64,
    name: &str,
    assignee: Option<i64>,
) -> serde_json::Value {
    let body = serde_json::json!({
        "project_id": project_id,
        "name": name,
        "due_date": "2030-01-01T00:00:00Z",
        "assigned_to_id": assignee,
    });
    let response = post_json_auth(app, "/api/tasks", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// A fresh, empty directory for upload tests.
pub fn temp_upload_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().to_path_buf();
    (dir, path)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
