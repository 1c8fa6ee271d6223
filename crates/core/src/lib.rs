//! Domain types and rules shared by every ProjectHub crate.
//!
//! Nothing in here performs I/O: the database layer, the HTTP handlers, the
//! WebSocket gateway and the background schedulers all depend on this crate
//! for identifiers, enumerations, permission checks and the real-time wire
//! protocol.

pub mod error;
pub mod notification;
pub mod pagination;
pub mod permissions;
pub mod project;
pub mod realtime;
pub mod roles;
pub mod status;
pub mod task;
pub mod types;
pub mod upload;
