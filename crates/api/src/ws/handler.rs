use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use projecthub_core::error::CoreError;
use projecthub_core::realtime::{Room, ServerEvent};
use projecthub_db::models::user::User;
use projecthub_db::repositories::{NotificationRepo, ProjectRepo};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::auth::{authenticate, token_from_headers};
use crate::state::AppState;
use crate::ws::gateway::{self, Session};
use crate::ws::manager::event_message;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /api/ws
///
/// Authenticates the handshake, then upgrades. The token comes from the
/// `token` query parameter or the `Authorization` header; a missing or
/// invalid token, or an inactive user, is rejected with 401 before the
/// upgrade happens.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| token_from_headers(&headers))
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Authentication required".into())))?;

    let user = authenticate(&state, token).await?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, user))
        .into_response())
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers the connection, joins its rooms, pushes the unread count, then
/// runs a sender task (channel -> sink) alongside the receive loop on the
/// current task. On disconnect the connection's project rooms are told the
/// user went offline.
async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let ws_manager = state.ws_manager.clone();

    let mut rx = ws_manager.add(conn_id.clone(), user.id).await;

    match ProjectRepo::ids_for_user(&state.pool, user.id).await {
        Ok(project_ids) => {
            for project_id in &project_ids {
                ws_manager.join(&conn_id, Room::Project(*project_id)).await;
            }
            tracing::info!(
                conn_id = %conn_id,
                user_id = user.id,
                project_rooms = project_ids.len(),
                "WebSocket connected"
            );
        }
        Err(e) => {
            tracing::error!(conn_id = %conn_id, user_id = user.id, error = %e, "Failed to join project rooms");
        }
    }

    match NotificationRepo::unread_count(&state.pool, user.id).await {
        Ok(count) => {
            if let Some(frame) = event_message(&ServerEvent::NotificationsCount { count }) {
                ws_manager.send_to(&conn_id, frame).await;
            }
        }
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "Failed to load unread notification count");
        }
    }

    let session = Session {
        conn_id: conn_id.clone(),
        user: user.summary(),
        role: user.role.clone(),
    };

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                gateway::handle_text(&state, &session, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    let rooms = ws_manager.remove(&conn_id).await;
    send_task.abort();

    let offline = ServerEvent::UserOffline {
        user_id: user.id,
        username: user.username.clone(),
        timestamp: Utc::now(),
    };
    for room in rooms.into_iter().filter(|r| matches!(r, Room::Project(_))) {
        ws_manager.emit_to_room(room, &offline, None).await;
    }

    tracing::info!(conn_id = %conn_id, user_id = user.id, "WebSocket disconnected");
}
