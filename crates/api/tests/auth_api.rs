//! HTTP-level integration tests for registration, login, token refresh and
//! the caller's profile.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, put_json_auth, seed_user, TEST_PASSWORD};
use projecthub_core::roles::{ROLE_ADMIN, ROLE_EMPLOYEE, ROLE_PROJECT_MANAGER};
use projecthub_db::repositories::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn register_body(username: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": format!("{username}@Example.com"),
        "password": "secret123",
        "full_name": "Jane Doe",
    })
}

async fn login(app: axum::Router, email: &str, password: &str) -> axum::response::Response {
    let body = serde_json::json!({ "email": email, "password": password });
    post_json(app, "/api/auth/login", body).await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_defaults_to_employee(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/auth/register", register_body("jane")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["token"].is_string(), "response must contain token");
    assert!(json["refreshToken"].is_string(), "response must contain refreshToken");
    assert_eq!(json["user"]["username"], "jane");
    assert_eq!(json["user"]["email"], "jane@example.com");
    assert_eq!(json["user"]["role"], ROLE_EMPLOYEE);
    assert!(json["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_with_manager_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut body = register_body("pm");
    body["role"] = ROLE_PROJECT_MANAGER.into();
    let response = post_json(app, "/api/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user"]["role"], ROLE_PROJECT_MANAGER);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_admin_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut body = register_body("sneaky");
    body["role"] = ROLE_ADMIN.into();
    let response = post_json(app, "/api/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_unknown_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut body = register_body("odd");
    body["role"] = "Overlord".into();
    let response = post_json(app, "/api/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut body = register_body("shorty");
    body["password"] = "abc".into();
    let response = post_json(app, "/api/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rejects_invalid_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut body = register_body("bademail");
    body["email"] = "not-an-email".into();
    let response = post_json(app, "/api/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_duplicate_email_returns_409(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(app.clone(), "/api/auth/register", register_body("dupe")).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let mut body = register_body("dupe2");
    body["email"] = "dupe@example.com".into();
    let second = post_json(app, "/api/auth/register", body).await;

    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(second).await["error"],
        "A user with this email already exists"
    );
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success_records_last_login(pool: PgPool) {
    let (user, _) = seed_user(&pool, "loginuser", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());

    let response = login(app, "loginuser@test.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["id"], user.id);

    let reloaded = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(reloaded.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    seed_user(&pool, "wrongpw", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let response = login(app, "wrongpw@test.com", "incorrect_password").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_unknown_email_looks_like_wrong_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = login(app, "nobody@test.com", TEST_PASSWORD).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_inactive_user(pool: PgPool) {
    let (user, _) = seed_user(&pool, "inactive", ROLE_EMPLOYEE).await;
    UserRepo::set_active(&pool, user.id, false).await.unwrap();
    let app = common::build_test_app(pool);

    let response = login(app, "inactive@test.com", TEST_PASSWORD).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Account is deactivated");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_inactive_user_with_wrong_password(pool: PgPool) {
    let (user, _) = seed_user(&pool, "dormant", ROLE_EMPLOYEE).await;
    UserRepo::set_active(&pool, user.id, false).await.unwrap();
    let app = common::build_test_app(pool);

    let response = login(app, "dormant@test.com", "not_the_password").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["token"].is_null());
    assert_eq!(json["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_refresh(pool: PgPool) {
    let app = common::build_test_app(pool);

    let registered = post_json(app.clone(), "/api/auth/register", register_body("refresher")).await;
    let json = body_json(registered).await;
    let refresh_token = json["refreshToken"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refreshToken": refresh_token });
    let response = post_json(app.clone(), "/api/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let new_token = body_json(response).await["token"].as_str().unwrap().to_string();
    let profile = get_auth(app, "/api/auth/profile", &new_token).await;
    assert_eq!(profile.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_access_token_is_not_a_refresh_token(pool: PgPool) {
    let (_, token) = seed_user(&pool, "mixup", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "refreshToken": token });
    let response = post_json(app, "/api/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_without_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/auth/refresh", serde_json::json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Refresh token required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_garbage_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/auth/profile", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivated_user_token_stops_working(pool: PgPool) {
    let (user, token) = seed_user(&pool, "revoked", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());

    let before = get_auth(app.clone(), "/api/auth/profile", &token).await;
    assert_eq!(before.status(), StatusCode::OK);

    UserRepo::set_active(&pool, user.id, false).await.unwrap();

    let after = get_auth(app, "/api/auth/profile", &token).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_profile_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/auth/profile").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_profile(pool: PgPool) {
    let (_, token) = seed_user(&pool, "profiled", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "full_name": "New Name", "major": "Physics" });
    let response = put_json_auth(app.clone(), "/api/auth/profile", body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_auth(app, "/api/auth/profile", &token).await).await;
    assert_eq!(json["data"]["full_name"], "New Name");
    assert_eq!(json["data"]["major"], "Physics");
}
