//! Domain event fan-out: notification rows plus live emissions.
//!
//! Handlers call into [`Broadcaster`] after their mutation has committed.
//! Nothing here returns an error: a failed notification write or a failed
//! emission is logged and the request carries on.

use std::collections::BTreeSet;
use std::sync::Arc;

use projecthub_core::notification::NotificationDraft;
use projecthub_core::realtime::{Room, ServerEvent};
use projecthub_core::types::DbId;
use projecthub_db::models::notification::{CreateNotification, Notification};
use projecthub_db::repositories::NotificationRepo;
use projecthub_db::DbPool;
use projecthub_events::NotificationSink;

use crate::state::AppState;
use crate::ws::manager::event_message;
use crate::ws::WsManager;

/// Writes notifications and pushes live events for one request.
#[derive(Clone)]
pub struct Broadcaster {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl Broadcaster {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone(), Arc::clone(&state.ws_manager))
    }

    /// Write `draft` once per recipient and push `notification:new` to each
    /// recipient's room.
    ///
    /// `actor` is removed from the recipients so nobody is notified about
    /// their own action. Duplicate recipients are collapsed. Returns the rows
    /// that were written (empty on failure).
    pub async fn notify(
        &self,
        recipients: &[DbId],
        actor: Option<DbId>,
        draft: &NotificationDraft,
    ) -> Vec<Notification> {
        let recipients: BTreeSet<DbId> = recipients
            .iter()
            .copied()
            .filter(|id| Some(*id) != actor)
            .collect();
        if recipients.is_empty() {
            return Vec::new();
        }

        let inputs: Vec<CreateNotification> = recipients
            .iter()
            .map(|user_id| CreateNotification::from_draft(*user_id, draft))
            .collect();

        let rows = match NotificationRepo::create_bulk(&self.pool, &inputs).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    kind = %draft.kind,
                    recipients = inputs.len(),
                    error = %e,
                    "Failed to write notifications"
                );
                return Vec::new();
            }
        };

        push_live(&self.ws_manager, &rows).await;
        rows
    }

    /// Emit an event to every connection in `room`.
    pub async fn emit(&self, room: Room, event: &ServerEvent) -> usize {
        let delivered = self.ws_manager.emit_to_room(room, event, None).await;
        tracing::debug!(room = %room, event = event.name(), delivered, "Emitted live event");
        delivered
    }

    /// Emit an event to `room`, skipping every connection of `user_id`.
    pub async fn emit_except_user(&self, room: Room, event: &ServerEvent, user_id: DbId) -> usize {
        let Some(message) = event_message(event) else {
            return 0;
        };
        let delivered = self
            .ws_manager
            .send_to_room_except_user(room, message, user_id)
            .await;
        tracing::debug!(room = %room, event = event.name(), delivered, "Emitted live event");
        delivered
    }
}

async fn push_live(ws_manager: &WsManager, rows: &[Notification]) {
    for row in rows {
        let Some(notification) = row.to_live() else {
            tracing::warn!(notification_id = row.id, kind = %row.kind, "Unknown notification type");
            continue;
        };
        ws_manager
            .emit_to_user(row.user_id, &ServerEvent::NotificationNew { notification })
            .await;
    }
}

/// Pushes notifications written by background jobs to live connections.
pub struct LiveNotifier {
    ws_manager: Arc<WsManager>,
}

impl LiveNotifier {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }
}

impl NotificationSink for LiveNotifier {
    fn notify(&self, notifications: &[Notification]) {
        let ws_manager = Arc::clone(&self.ws_manager);
        let rows = notifications.to_vec();
        tokio::spawn(async move {
            push_live(&ws_manager, &rows).await;
        });
    }
}
