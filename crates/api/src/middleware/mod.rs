//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated, active user from a JWT.
//! - [`rbac::RequireAdmin`] -- Requires the `Admin` role.
//! - [`rbac::RequireManager`] -- Requires `Admin` or `Project Manager`.

pub mod auth;
pub mod rbac;
