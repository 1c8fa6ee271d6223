//! Dispatch of client events received over an authenticated connection.
//!
//! Every client event is fire-and-forget: the only replies a sender ever
//! gets are `error` events for frames that cannot be acted on.

use chrono::Utc;
use projecthub_core::notification;
use projecthub_core::permissions::{ProjectAccess, ProjectAction};
use projecthub_core::realtime::{parse_recipient_id, ClientEvent, Room, ServerEvent, UserSummary};
use projecthub_core::types::DbId;
use projecthub_db::repositories::{ProjectRepo, UserRepo};

use crate::notifications::Broadcaster;
use crate::state::AppState;
use crate::ws::manager::event_message;

/// Longest accepted direct message, in characters.
pub const MAX_DIRECT_MESSAGE_LEN: usize = 2000;

/// The authenticated identity behind one connection.
#[derive(Debug, Clone)]
pub struct Session {
    pub conn_id: String,
    pub user: UserSummary,
    pub role: String,
}

/// Decode and act on one text frame.
pub async fn handle_text(state: &AppState, session: &Session, text: &str) {
    match ClientEvent::decode(text) {
        Ok(event) => dispatch(state, session, event).await,
        Err(e) => {
            tracing::debug!(conn_id = %session.conn_id, error = %e, "Rejected client frame");
            reply_error(state, session, format!("Invalid event: {e}")).await;
        }
    }
}

/// Act on a decoded client event.
pub async fn dispatch(state: &AppState, session: &Session, event: ClientEvent) {
    let ws = &state.ws_manager;
    let conn_id = session.conn_id.as_str();

    match event {
        ClientEvent::ProjectJoin { project_id } => {
            if let Err(message) = check_can_view(state, session, project_id).await {
                reply_error(state, session, message).await;
                return;
            }
            let room = Room::Project(project_id);
            ws.join(conn_id, room).await;
            ws.emit_to_room(room, &ServerEvent::user_joined(session.user.clone()), Some(conn_id))
                .await;
            tracing::debug!(conn_id, project_id, "Joined project room");
        }

        ClientEvent::ProjectLeave { project_id } => {
            let room = Room::Project(project_id);
            ws.leave(conn_id, room).await;
            ws.emit_to_room(room, &ServerEvent::user_left(session.user.clone()), Some(conn_id))
                .await;
        }

        ClientEvent::UserStatus { status } => {
            let event = ServerEvent::UserStatusChanged {
                user_id: session.user.id,
                username: session.user.username.clone(),
                status,
            };
            ws.emit_to_room(Room::User(session.user.id), &event, Some(conn_id))
                .await;
        }

        ClientEvent::TaskStatusUpdate {
            task_id,
            project_id,
            old_status,
            new_status,
        } => {
            let room = Room::Project(project_id);
            if !ws.in_room(conn_id, room).await {
                reply_error(state, session, "Access denied to this project").await;
                return;
            }
            let event = ServerEvent::TaskStatusUpdated {
                task_id,
                old_status,
                new_status,
                updated_by: session.user.full_name.clone(),
                timestamp: Utc::now(),
            };
            ws.emit_to_room(room, &event, Some(conn_id)).await;
        }

        ClientEvent::CommentTyping {
            entity_type,
            entity_id,
        } => {
            let event = ServerEvent::CommentUserTyping {
                entity_type,
                entity_id,
                user: session.user.clone(),
            };
            if let Some(message) = event_message(&event) {
                ws.broadcast_except(message, conn_id).await;
            }
        }

        ClientEvent::CommentStopTyping {
            entity_type,
            entity_id,
        } => {
            let event = ServerEvent::CommentUserStopTyping {
                entity_type,
                entity_id,
                user_id: session.user.id,
            };
            if let Some(message) = event_message(&event) {
                ws.broadcast_except(message, conn_id).await;
            }
        }

        ClientEvent::PrivateMessage {
            recipient_id,
            message,
        } => {
            let Some(recipient_id) = parse_recipient_id(&recipient_id) else {
                reply_error(state, session, "Invalid recipient ID").await;
                return;
            };
            send_direct_message(state, session, recipient_id, message).await;
        }
    }
}

async fn send_direct_message(state: &AppState, session: &Session, recipient_id: DbId, message: String) {
    let message = message.trim().to_string();
    if message.is_empty() {
        reply_error(state, session, "Message cannot be empty").await;
        return;
    }
    if message.chars().count() > MAX_DIRECT_MESSAGE_LEN {
        reply_error(
            state,
            session,
            format!("Message cannot exceed {MAX_DIRECT_MESSAGE_LEN} characters"),
        )
        .await;
        return;
    }

    match UserRepo::find_by_id(&state.pool, recipient_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            reply_error(state, session, "Recipient not found").await;
            return;
        }
        Err(e) => {
            tracing::error!(recipient_id, error = %e, "Failed to look up message recipient");
            return;
        }
    }

    let broadcaster = Broadcaster::from_state(state);
    let event = ServerEvent::MessageReceived {
        from: session.user.clone(),
        message,
        timestamp: Utc::now(),
    };
    broadcaster.emit(Room::User(recipient_id), &event).await;

    let draft = notification::direct_message(session.user.id, &session.user.full_name);
    broadcaster.notify(&[recipient_id], None, &draft).await;
}

/// Whether the session may join a project's room.
///
/// Status relays only go to rooms the connection is already in, so this is
/// the single access gate for project rooms.
async fn check_can_view(state: &AppState, session: &Session, project_id: DbId) -> Result<(), String> {
    let project = match ProjectRepo::find_by_id(&state.pool, project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => return Err("Project not found".into()),
        Err(e) => {
            tracing::error!(project_id, error = %e, "Failed to load project for room join");
            return Err("Could not join project".into());
        }
    };
    let is_member = match ProjectRepo::is_member(&state.pool, project_id, session.user.id).await {
        Ok(is_member) => is_member,
        Err(e) => {
            tracing::error!(project_id, error = %e, "Failed to check project membership for room join");
            return Err("Could not join project".into());
        }
    };

    ProjectAccess::resolve(session.user.id, &session.role, project.owner_id, is_member)
        .require(ProjectAction::View)
        .map_err(|e| match e {
            projecthub_core::error::CoreError::Forbidden(msg) => msg,
            other => other.to_string(),
        })
}

async fn reply_error(state: &AppState, session: &Session, message: impl Into<String>) {
    if let Some(frame) = event_message(&ServerEvent::error(message)) {
        state.ws_manager.send_to(&session.conn_id, frame).await;
    }
}
