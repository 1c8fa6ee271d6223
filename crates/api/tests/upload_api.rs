//! Integration tests for multipart uploads and static serving of the stored
//! files.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, send, seed_user, test_config};
use projecthub_core::roles::ROLE_EMPLOYEE;
use projecthub_db::repositories::UserRepo;
use sqlx::PgPool;

const BOUNDARY: &str = "projecthub-test-boundary";

/// One part of a multipart body: `(field, Some((file name, content type)), bytes)`.
type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_avatar_upload_updates_user_and_is_served(pool: PgPool) {
    let (user, token) = seed_user(&pool, "pictured", ROLE_EMPLOYEE).await;
    let (_dir, upload_dir) = common::temp_upload_dir();
    let config = projecthub_api::config::ServerConfig {
        upload_dir: upload_dir.clone(),
        ..test_config()
    };
    let (app, _) = common::build_test_app_with_config(pool.clone(), config);

    let png = b"\x89PNG\r\n\x1a\nnot-really-a-png";
    let body = multipart_body(&[("avatar", Some(("My Face.PNG", "image/png")), png)]);
    let response = send(app.clone(), upload_request("/api/upload/avatar", &token, body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let file_path = json["data"]["file_path"].as_str().unwrap().to_string();
    assert!(file_path.starts_with("uploads/avatars/My_Face-"), "{file_path}");
    assert!(file_path.ends_with(".png"), "{file_path}");
    assert_eq!(json["data"]["original_name"], "My Face.PNG");
    assert_eq!(json["data"]["size"], png.len());
    assert_eq!(json["data"]["user"]["avatar"], file_path.as_str());

    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.avatar.as_deref(), Some(file_path.as_str()));

    let file_name = json["data"]["file_name"].as_str().unwrap();
    assert!(upload_dir.join("avatars").join(file_name).exists());

    let served = get(app, &format!("/{file_path}")).await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_avatar_rejects_non_images(pool: PgPool) {
    let (_, token) = seed_user(&pool, "sneaky", ROLE_EMPLOYEE).await;
    let (_dir, upload_dir) = common::temp_upload_dir();
    let config = projecthub_api::config::ServerConfig {
        upload_dir,
        ..test_config()
    };
    let (app, _) = common::build_test_app_with_config(pool, config);

    let body = multipart_body(&[("avatar", Some(("notes.pdf", "application/pdf")), b"%PDF-1.4")]);
    let response = send(app, upload_request("/api/upload/avatar", &token, body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Only image files are allowed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_file_upload_uses_requested_category(pool: PgPool) {
    let (_, token) = seed_user(&pool, "filer", ROLE_EMPLOYEE).await;
    let (_dir, upload_dir) = common::temp_upload_dir();
    let config = projecthub_api::config::ServerConfig {
        upload_dir: upload_dir.clone(),
        ..test_config()
    };
    let (app, _) = common::build_test_app_with_config(pool, config);

    let body = multipart_body(&[
        ("category", None, b"comments"),
        ("file", Some(("report.csv", "text/csv")), b"a,b\n1,2\n"),
    ]);
    let response = send(app, upload_request("/api/upload/file", &token, body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let file_path = json["data"]["file_path"].as_str().unwrap();
    assert!(file_path.starts_with("uploads/comments/report-"), "{file_path}");
    assert_eq!(json["data"]["mime_type"], "text/csv");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_file_upload_rejects_oversized_and_missing_files(pool: PgPool) {
    let (_, token) = seed_user(&pool, "bulky", ROLE_EMPLOYEE).await;
    let (_dir, upload_dir) = common::temp_upload_dir();
    let config = projecthub_api::config::ServerConfig {
        upload_dir,
        max_file_size: 16,
        ..test_config()
    };
    let (app, _) = common::build_test_app_with_config(pool, config);

    let big = vec![b'x'; 32];
    let body = multipart_body(&[("file", Some(("big.txt", "text/plain")), &big)]);
    let response = send(app.clone(), upload_request("/api/upload/file", &token, body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = multipart_body(&[("category", None, b"tasks")]);
    let response = send(app, upload_request("/api/upload/file", &token, body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upload_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = multipart_body(&[("file", Some(("a.txt", "text/plain")), b"hi")]);
    let request = Request::post("/api/upload/file")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
