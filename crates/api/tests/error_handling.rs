//! Error responses as seen through real routes: every failure carries the
//! `{error, code}` body with the status its category maps to.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_project, get, get_auth, post_json, put_json_auth, seed_user,
};
use projecthub_core::roles::{ROLE_EMPLOYEE, ROLE_PROJECT_MANAGER};
use projecthub_db::models::notification::CreateNotification;
use projecthub_db::repositories::NotificationRepo;
use sqlx::PgPool;

fn register_body(username: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": email,
        "password": "secret123",
        "full_name": "Sam Doe",
    })
}

// ---------------------------------------------------------------------------
// 400
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_registration_returns_validation_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/auth/register", register_body("ab", "ab@test.com")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Username must be 3-30 characters");
}

// ---------------------------------------------------------------------------
// 401 / 403
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_returns_unauthorized_json(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/notifications").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert!(json["error"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_owner_project_update_is_forbidden(pool: PgPool) {
    let (_, owner_token) = seed_user(&pool, "owner", ROLE_PROJECT_MANAGER).await;
    let (_, outsider_token) = seed_user(&pool, "outsider", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let project = create_project(app.clone(), &owner_token, "Locked", &[]).await;
    let uri = format!("/api/projects/{}", project["id"]);
    let body = serde_json::json!({ "name": "Taken over" });

    let response = put_json_auth(app, &uri, body, &outsider_token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// 404
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_project_returns_not_found(pool: PgPool) {
    let (_, token) = seed_user(&pool, "viewer", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/projects/999999", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id 999999 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn marking_someone_elses_notification_returns_not_found(pool: PgPool) {
    let (alice, _) = seed_user(&pool, "alice", ROLE_EMPLOYEE).await;
    let (_, bob_token) = seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let notification = NotificationRepo::create(
        &pool,
        &CreateNotification {
            user_id: alice.id,
            kind: "task_assigned".into(),
            title: "Task Assigned".into(),
            message: "for alice".into(),
            related_entity_type: None,
            related_entity_id: None,
        },
    )
    .await
    .unwrap();
    let app = common::build_test_app(pool.clone());

    let uri = format!("/api/notifications/{}/read", notification.id);
    let response = put_json_auth(app, &uri, serde_json::json!({}), &bob_token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Notification not found");
    assert_eq!(NotificationRepo::unread_count(&pool, alice.id).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// 409
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_returns_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(app.clone(), "/api/auth/register", register_body("sam", "sam@test.com")).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second =
        post_json(app, "/api/auth/register", register_body("sam", "other@test.com")).await;

    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "A user with this username already exists");
}

// ---------------------------------------------------------------------------
// 500
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn database_failure_returns_generic_500(pool: PgPool) {
    let (_, token) = seed_user(&pool, "unlucky", ROLE_EMPLOYEE).await;
    sqlx::query("DROP TABLE notifications")
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/notifications", &token).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
    assert!(!json.to_string().contains("notifications"));
}
