//! Real-time gateway.
//!
//! Provides connection and room management, dispatch of client events,
//! heartbeat monitoring, and the HTTP upgrade handler used by Axum routes.

pub mod gateway;
mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
