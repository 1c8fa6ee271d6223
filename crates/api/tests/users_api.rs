//! Integration tests for the user directory and account administration.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_project, get_auth, post_json, put_json_auth, seed_user, TEST_PASSWORD,
};
use projecthub_core::roles::{ROLE_ADMIN, ROLE_EMPLOYEE, ROLE_PROJECT_MANAGER};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_users_requires_manager_or_admin(pool: PgPool) {
    let (_, employee_token) = seed_user(&pool, "worker", ROLE_EMPLOYEE).await;
    let (_, manager_token) = seed_user(&pool, "boss", ROLE_PROJECT_MANAGER).await;
    let app = common::build_test_app(pool);

    let denied = get_auth(app.clone(), "/api/users", &employee_token).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let allowed = get_auth(app, "/api/users", &manager_token).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    let json = body_json(allowed).await;
    assert_eq!(json["data"]["total"], 2);
    assert!(json["data"]["items"][0].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_users_filters_by_role_and_search(pool: PgPool) {
    seed_user(&pool, "ann", ROLE_EMPLOYEE).await;
    seed_user(&pool, "andy", ROLE_PROJECT_MANAGER).await;
    let (_, admin_token) = seed_user(&pool, "root", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/users?role={}", urlencode(ROLE_PROJECT_MANAGER));
    let by_role = body_json(get_auth(app.clone(), &uri, &admin_token).await).await;
    assert_eq!(by_role["data"]["total"], 1);
    assert_eq!(by_role["data"]["items"][0]["username"], "andy");

    let by_search = body_json(get_auth(app, "/api/users?search=an", &admin_token).await).await;
    assert_eq!(by_search["data"]["total"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_user_includes_project_stats(pool: PgPool) {
    let (owner, token) = seed_user(&pool, "owner", ROLE_PROJECT_MANAGER).await;
    let (member, _) = seed_user(&pool, "member", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    create_project(app.clone(), &token, "Stats", &[member.id]).await;

    let json = body_json(get_auth(app.clone(), &format!("/api/users/{}", owner.id), &token).await).await;
    assert_eq!(json["data"]["username"], "owner");
    assert_eq!(json["data"]["project_stats"]["owned_projects"], 1);

    let json = body_json(get_auth(app, &format!("/api/users/{}", member.id), &token).await).await;
    assert_eq!(json["data"]["project_stats"]["member_projects"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lookup_by_email(pool: PgPool) {
    let (target, token) = seed_user(&pool, "findme", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let found = get_auth(app.clone(), "/api/users/by-email?email=FINDME@test.com", &token).await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body_json(found).await["data"]["id"], target.id);

    let missing = get_auth(app.clone(), "/api/users/by-email?email=ghost@test.com", &token).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let empty = get_auth(app, "/api/users/by-email", &token).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_role_changes_are_admin_only(pool: PgPool) {
    let (worker, worker_token) = seed_user(&pool, "worker", ROLE_EMPLOYEE).await;
    let (_, admin_token) = seed_user(&pool, "root", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/users/{}", worker.id);

    let body = serde_json::json!({ "role": ROLE_ADMIN });
    let denied = put_json_auth(app.clone(), &uri, body, &worker_token).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "role": ROLE_PROJECT_MANAGER });
    let promoted = put_json_auth(app.clone(), &uri, body, &admin_token).await;
    assert_eq!(promoted.status(), StatusCode::OK);
    assert_eq!(body_json(promoted).await["data"]["role"], ROLE_PROJECT_MANAGER);

    let body = serde_json::json!({ "full_name": "Renamed" });
    let self_edit = put_json_auth(app, &uri, body, &worker_token).await;
    assert_eq!(self_edit.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cannot_edit_someone_else(pool: PgPool) {
    let (_, a_token) = seed_user(&pool, "alice", ROLE_PROJECT_MANAGER).await;
    let (bob, _) = seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "full_name": "Not Bob" });
    let response = put_json_auth(app, &format!("/api/users/{}", bob.id), body, &a_token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_and_reactivate(pool: PgPool) {
    let (admin, admin_token) = seed_user(&pool, "root", ROLE_ADMIN).await;
    let (worker, _) = seed_user(&pool, "worker", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);
    let empty = serde_json::json!({});

    let own = put_json_auth(app.clone(), &format!("/api/users/{}/deactivate", admin.id), empty.clone(), &admin_token).await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let off = put_json_auth(app.clone(), &format!("/api/users/{}/deactivate", worker.id), empty.clone(), &admin_token).await;
    assert_eq!(off.status(), StatusCode::OK);
    assert_eq!(body_json(off).await["data"]["is_active"], false);

    let login = serde_json::json!({ "email": "worker@test.com", "password": TEST_PASSWORD });
    let blocked = post_json(app.clone(), "/api/auth/login", login.clone()).await;
    assert_eq!(blocked.status(), StatusCode::UNAUTHORIZED);

    let on = put_json_auth(app.clone(), &format!("/api/users/{}/activate", worker.id), empty, &admin_token).await;
    assert_eq!(on.status(), StatusCode::OK);

    let allowed = post_json(app, "/api/auth/login", login).await;
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password(pool: PgPool) {
    let (user, token) = seed_user(&pool, "rotator", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/users/{}/change-password", user.id);

    let wrong = serde_json::json!({ "current_password": "nope", "new_password": "brand-new-pw" });
    let response = put_json_auth(app.clone(), &uri, wrong, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Current password is incorrect");

    let right = serde_json::json!({ "current_password": TEST_PASSWORD, "new_password": "brand-new-pw" });
    let response = put_json_auth(app.clone(), &uri, right, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let login = serde_json::json!({ "email": "rotator@test.com", "password": "brand-new-pw" });
    let response = post_json(app, "/api/auth/login", login).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_projects_self_or_admin(pool: PgPool) {
    let (alice, a_token) = seed_user(&pool, "alice", ROLE_PROJECT_MANAGER).await;
    let (_, b_token) = seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool);

    create_project(app.clone(), &a_token, "Mine", &[]).await;
    let uri = format!("/api/users/{}/projects", alice.id);

    let own = body_json(get_auth(app.clone(), &uri, &a_token).await).await;
    assert_eq!(own["data"].as_array().unwrap().len(), 1);

    let denied = get_auth(app, &uri, &b_token).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

fn urlencode(value: &str) -> String {
    value.replace(' ', "%20")
}
