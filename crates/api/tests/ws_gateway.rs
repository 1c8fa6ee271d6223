//! End-to-end tests for the WebSocket gateway.
//!
//! Each test serves the real router on an ephemeral port and talks to it
//! with a `tokio-tungstenite` client.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use projecthub_api::router::build_app_router;
use projecthub_api::state::AppState;
use projecthub_core::notification;
use projecthub_core::roles::{ROLE_EMPLOYEE, ROLE_PROJECT_MANAGER};
use projecthub_db::models::notification::CreateNotification;
use projecthub_db::repositories::NotificationRepo;
use sqlx::PgPool;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn spawn_server(pool: PgPool) -> (SocketAddr, AppState) {
    let config = common::test_config();
    let state = common::test_state(pool, config.clone());
    let app = build_app_router(state.clone(), &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Connect and consume the initial `notifications:count` event, which also
/// guarantees the server has registered the connection.
async fn connect(addr: SocketAddr, token: &str) -> (Client, i64) {
    let (mut client, _) = connect_async(format!("ws://{addr}/api/ws?token={token}"))
        .await
        .expect("handshake should succeed");
    let first = next_event(&mut client).await;
    assert_eq!(first["event"], "notifications:count");
    let count = first["data"]["count"].as_i64().unwrap();
    (client, count)
}

async fn next_event(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_event(client: &mut Client, event: serde_json::Value) {
    client
        .send(WsMessage::Text(event.to_string().into()))
        .await
        .unwrap();
}

async fn handshake_status(addr: SocketAddr, query: &str) -> u16 {
    match connect_async(format!("ws://{addr}/api/ws{query}")).await {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("unexpected handshake error: {other}"),
        Ok(_) => panic!("handshake should have been rejected"),
    }
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn handshake_without_valid_token_is_rejected(pool: PgPool) {
    let (addr, _) = spawn_server(pool).await;

    assert_eq!(handshake_status(addr, "").await, 401);
    assert_eq!(handshake_status(addr, "?token=garbage").await, 401);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn connect_pushes_unread_count(pool: PgPool) {
    let (user, token) = common::seed_user(&pool, "counted", ROLE_EMPLOYEE).await;
    let drafts = [
        notification::task_updated(1, "One"),
        notification::task_updated(2, "Two"),
    ];
    let inputs: Vec<CreateNotification> = drafts
        .iter()
        .map(|d| CreateNotification::from_draft(user.id, d))
        .collect();
    NotificationRepo::create_bulk(&pool, &inputs).await.unwrap();
    let (addr, state) = spawn_server(pool).await;

    let (_client, count) = connect(addr, &token).await;

    assert_eq!(count, 2);
    assert_eq!(state.ws_manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Client events
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn private_message_reaches_recipient_with_notification(pool: PgPool) {
    let (_, a_token) = common::seed_user(&pool, "alice", ROLE_EMPLOYEE).await;
    let (bob, b_token) = common::seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let (addr, _) = spawn_server(pool.clone()).await;

    let (mut alice, _) = connect(addr, &a_token).await;
    let (mut bob_client, _) = connect(addr, &b_token).await;

    send_event(
        &mut alice,
        serde_json::json!({
            "event": "message:private",
            "data": { "recipient_id": bob.id.to_string(), "message": "  lunch?  " },
        }),
    )
    .await;

    let received = next_event(&mut bob_client).await;
    assert_eq!(received["event"], "message:received");
    assert_eq!(received["data"]["message"], "lunch?");
    assert_eq!(received["data"]["from"]["username"], "alice");

    let notified = next_event(&mut bob_client).await;
    assert_eq!(notified["event"], "notification:new");
    assert_eq!(notified["data"]["notification"]["type"], "message_received");

    assert_eq!(NotificationRepo::unread_count(&pool, bob.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_frames_get_error_replies(pool: PgPool) {
    let (_, token) = common::seed_user(&pool, "clumsy", ROLE_EMPLOYEE).await;
    let (addr, _) = spawn_server(pool).await;
    let (mut client, _) = connect(addr, &token).await;

    client
        .send(WsMessage::Text("not json".to_string().into()))
        .await
        .unwrap();
    let reply = next_event(&mut client).await;
    assert_eq!(reply["event"], "error");

    send_event(
        &mut client,
        serde_json::json!({
            "event": "message:private",
            "data": { "recipient_id": "abc", "message": "hi" },
        }),
    )
    .await;
    let reply = next_event(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "Invalid recipient ID");

    send_event(
        &mut client,
        serde_json::json!({
            "event": "message:private",
            "data": { "recipient_id": 999_999, "message": "hi" },
        }),
    )
    .await;
    let reply = next_event(&mut client).await;
    assert_eq!(reply["data"]["message"], "Recipient not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn outsider_cannot_join_project_room(pool: PgPool) {
    let (_, owner_token) = common::seed_user(&pool, "owner", ROLE_PROJECT_MANAGER).await;
    let (_, outsider_token) = common::seed_user(&pool, "outsider", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());
    let project = common::create_project(app, &owner_token, "Private", &[]).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut client, _) = connect(addr, &outsider_token).await;
    send_event(
        &mut client,
        serde_json::json!({ "event": "project:join", "data": { "project_id": project["id"] } }),
    )
    .await;

    let reply = next_event(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "Access denied to this project");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn project_room_sees_status_updates_and_disconnects(pool: PgPool) {
    let (_, a_token) = common::seed_user(&pool, "alice", ROLE_PROJECT_MANAGER).await;
    let (bob, b_token) = common::seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());
    let project = common::create_project(app, &a_token, "Live", &[bob.id]).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut alice, _) = connect(addr, &a_token).await;
    let (mut bob_client, _) = connect(addr, &b_token).await;

    send_event(
        &mut bob_client,
        serde_json::json!({
            "event": "task:status_update",
            "data": {
                "task_id": 1,
                "project_id": project["id"],
                "old_status": "To Do",
                "new_status": "In Progress",
            },
        }),
    )
    .await;

    let update = next_event(&mut alice).await;
    assert_eq!(update["event"], "task:status_updated");
    assert_eq!(update["data"]["new_status"], "In Progress");
    assert_eq!(update["data"]["updated_by"], "bob Tester");

    bob_client.close(None).await.unwrap();

    let offline = next_event(&mut alice).await;
    assert_eq!(offline["event"], "user:offline");
    assert_eq!(offline["data"]["user_id"], bob.id);
}

fn status_update(project_id: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "event": "task:status_update",
        "data": {
            "task_id": 1,
            "project_id": project_id,
            "old_status": "To Do",
            "new_status": "Done",
        },
    })
}

fn typing(event: &str, task_id: i64) -> serde_json::Value {
    serde_json::json!({
        "event": event,
        "data": { "entity_type": "Task", "entity_id": task_id },
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn leaving_a_project_room_notifies_occupants_and_stops_relays(pool: PgPool) {
    let (_, a_token) = common::seed_user(&pool, "alice", ROLE_PROJECT_MANAGER).await;
    let (bob, b_token) = common::seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());
    let project = common::create_project(app, &a_token, "Shared", &[bob.id]).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut alice, _) = connect(addr, &a_token).await;
    let (mut bob_client, _) = connect(addr, &b_token).await;

    send_event(
        &mut bob_client,
        serde_json::json!({ "event": "project:leave", "data": { "project_id": project["id"] } }),
    )
    .await;

    let left = next_event(&mut alice).await;
    assert_eq!(left["event"], "project:user_left");
    assert_eq!(left["data"]["user"]["id"], bob.id);
    assert_eq!(left["data"]["message"], "bob Tester left the project");

    // Alice's status relay skips bob; the typing broadcast after it is the
    // next thing bob sees.
    send_event(&mut alice, status_update(&project["id"])).await;
    send_event(&mut alice, typing("comment:typing", 1)).await;
    let next = next_event(&mut bob_client).await;
    assert_eq!(next["event"], "comment:user_typing");

    // Out of the room, bob can no longer relay into it.
    send_event(&mut bob_client, status_update(&project["id"])).await;
    let reply = next_event(&mut bob_client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "Access denied to this project");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn outsider_cannot_relay_status_into_a_project(pool: PgPool) {
    let (_, owner_token) = common::seed_user(&pool, "owner", ROLE_PROJECT_MANAGER).await;
    let (_, outsider_token) = common::seed_user(&pool, "outsider", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());
    let project = common::create_project(app, &owner_token, "Closed", &[]).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut owner, _) = connect(addr, &owner_token).await;
    let (mut outsider, _) = connect(addr, &outsider_token).await;

    send_event(&mut outsider, status_update(&project["id"])).await;
    let reply = next_event(&mut outsider).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "Access denied to this project");

    // Nothing reached the owner ahead of this broadcast.
    send_event(&mut outsider, typing("comment:stop_typing", 5)).await;
    let next = next_event(&mut owner).await;
    assert_eq!(next["event"], "comment:user_stop_typing");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_status_reaches_only_the_users_other_connections(pool: PgPool) {
    let (alice, a_token) = common::seed_user(&pool, "alice", ROLE_EMPLOYEE).await;
    let (_, b_token) = common::seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut laptop, _) = connect(addr, &a_token).await;
    let (mut phone, _) = connect(addr, &a_token).await;
    let (mut bob, _) = connect(addr, &b_token).await;

    send_event(
        &mut laptop,
        serde_json::json!({ "event": "user:status", "data": { "status": "away" } }),
    )
    .await;

    let changed = next_event(&mut phone).await;
    assert_eq!(changed["event"], "user:status_changed");
    assert_eq!(changed["data"]["user_id"], alice.id);
    assert_eq!(changed["data"]["username"], "alice");
    assert_eq!(changed["data"]["status"], "away");

    send_event(&mut laptop, typing("comment:typing", 9)).await;
    assert_eq!(next_event(&mut bob).await["event"], "comment:user_typing");

    // The sender itself gets neither; its next frame is the reply to garbage.
    laptop
        .send(WsMessage::Text("{}".to_string().into()))
        .await
        .unwrap();
    assert_eq!(next_event(&mut laptop).await["event"], "error");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn typing_indicators_reach_every_other_connection(pool: PgPool) {
    let (alice, a_token) = common::seed_user(&pool, "alice", ROLE_PROJECT_MANAGER).await;
    let (bob, b_token) = common::seed_user(&pool, "bob", ROLE_EMPLOYEE).await;
    let (_, c_token) = common::seed_user(&pool, "carol", ROLE_EMPLOYEE).await;
    let app = common::build_test_app(pool.clone());
    common::create_project(app, &a_token, "Team", &[bob.id]).await;
    let (addr, _) = spawn_server(pool).await;

    let (mut alice_client, _) = connect(addr, &a_token).await;
    let (mut bob_client, _) = connect(addr, &b_token).await;
    let (mut carol_client, _) = connect(addr, &c_token).await;

    send_event(&mut alice_client, typing("comment:typing", 42)).await;
    for client in [&mut bob_client, &mut carol_client] {
        let event = next_event(client).await;
        assert_eq!(event["event"], "comment:user_typing");
        assert_eq!(event["data"]["entity_type"], "Task");
        assert_eq!(event["data"]["entity_id"], 42);
        assert_eq!(event["data"]["user"]["id"], alice.id);
        assert_eq!(event["data"]["user"]["full_name"], "alice Tester");
    }

    send_event(&mut alice_client, typing("comment:stop_typing", 42)).await;
    for client in [&mut bob_client, &mut carol_client] {
        let event = next_event(client).await;
        assert_eq!(event["event"], "comment:user_stop_typing");
        assert_eq!(event["data"]["user_id"], alice.id);
    }
}
