use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use projecthub_core::realtime::{Room, ServerEvent};
use projecthub_core::types::DbId;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single authenticated WebSocket connection.
pub struct WsConnection {
    /// The user this connection was authenticated as.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// Rooms this connection currently receives events for.
    pub rooms: HashSet<Room>,
}

/// Encode a server event as a text frame. Encoding failures are logged and
/// the event is dropped.
pub fn event_message(event: &ServerEvent) -> Option<Message> {
    match event.encode() {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "Failed to encode server event");
            None
        }
    }
}

/// Manages all active WebSocket connections and their room membership.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Every send is a non-blocking push onto the
/// connection's unbounded channel, so emitting never waits on a slow client.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection for `user_id` and place it in the user's
    /// personal room.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            rooms: HashSet::from([Room::User(user_id)]),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID, returning the rooms it was in.
    pub async fn remove(&self, conn_id: &str) -> Vec<Room> {
        self.connections
            .write()
            .await
            .remove(conn_id)
            .map(|conn| conn.rooms.into_iter().collect())
            .unwrap_or_default()
    }

    /// Add a connection to a room. Returns `false` if it was already in it
    /// or the connection is gone.
    pub async fn join(&self, conn_id: &str, room: Room) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => conn.rooms.insert(room),
            None => false,
        }
    }

    /// Remove a connection from a room. Returns `false` if it was not in it.
    pub async fn leave(&self, conn_id: &str, room: Room) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => conn.rooms.remove(&room),
            None => false,
        }
    }

    /// Rooms a connection is currently in.
    pub async fn rooms_of(&self, conn_id: &str) -> Vec<Room> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .map(|conn| conn.rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a connection currently receives events for `room`.
    pub async fn in_room(&self, conn_id: &str, room: Room) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.rooms.contains(&room))
    }

    /// Put every open connection of `user_id` into `room`.
    ///
    /// Returns the number of connections that newly joined.
    pub async fn join_user_to_room(&self, user_id: DbId, room: Room) -> usize {
        let mut conns = self.connections.write().await;
        let mut count = 0;
        for conn in conns.values_mut() {
            if conn.user_id == user_id && conn.rooms.insert(room) {
                count += 1;
            }
        }
        count
    }

    /// Take every open connection of `user_id` out of `room`.
    pub async fn leave_user_from_room(&self, user_id: DbId, room: Room) -> usize {
        let mut conns = self.connections.write().await;
        let mut count = 0;
        for conn in conns.values_mut() {
            if conn.user_id == user_id && conn.rooms.remove(&room) {
                count += 1;
            }
        }
        count
    }

    /// Send a message to every connection in `room`, optionally skipping
    /// the originating connection.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn send_to_room(&self, room: Room, message: Message, except: Option<&str>) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for (id, conn) in conns.iter() {
            if except == Some(id.as_str()) || !conn.rooms.contains(&room) {
                continue;
            }
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Send a message to every connection in `room` that does not belong to
    /// `user_id`.
    pub async fn send_to_room_except_user(
        &self,
        room: Room,
        message: Message,
        user_id: DbId,
    ) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.user_id == user_id || !conn.rooms.contains(&room) {
                continue;
            }
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Send a message to a single connection.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Broadcast to every connection except `conn_id`.
    ///
    /// Connections whose send channels are closed are skipped; they are
    /// cleaned up when their receive loop ends.
    pub async fn broadcast_except(&self, message: Message, conn_id: &str) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for (id, conn) in conns.iter() {
            if id != conn_id && conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Encode and send an event to a room.
    pub async fn emit_to_room(&self, room: Room, event: &ServerEvent, except: Option<&str>) -> usize {
        match event_message(event) {
            Some(message) => self.send_to_room(room, message, except).await,
            None => 0,
        }
    }

    /// Encode and send an event to all of a user's connections.
    pub async fn emit_to_user(&self, user_id: DbId, event: &ServerEvent) -> usize {
        self.emit_to_room(Room::User(user_id), event, None).await
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Queue a Ping frame for every connection. Returns how many were still
    /// accepting messages.
    pub async fn ping_all(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok())
            .count()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
