//! Request handlers for the REST API.
//!
//! Each submodule provides async handler functions for a single resource.
//! Handlers delegate to the corresponding repository in `projecthub_db`,
//! map errors via [`AppError`](crate::error::AppError), and hand domain
//! events to the [`Broadcaster`](crate::notifications::Broadcaster) once
//! their mutation has committed.

pub mod access;
pub mod auth;
pub mod comment;
pub mod notification;
pub mod project;
pub mod task;
pub mod upload;
pub mod user;
