//! Well-known role name constants.
//!
//! These must match the `ck_users_role` CHECK constraint in
//! `20250101000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_PROJECT_MANAGER: &str = "Project Manager";
pub const ROLE_EMPLOYEE: &str = "Employee";

/// Role assigned at registration when none is supplied.
pub const DEFAULT_ROLE: &str = ROLE_EMPLOYEE;

pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_PROJECT_MANAGER, ROLE_EMPLOYEE];

pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Admins and project managers may browse the full user directory.
pub fn can_list_users(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_PROJECT_MANAGER
}
