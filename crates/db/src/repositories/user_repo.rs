//! Repository for the `users` table.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User, UserFilter, UserProjectStats};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, full_name, role, major, avatar, \
                       is_active, last_login_at, created_at, updated_at";

/// Shared WHERE clause for [`UserRepo::list`] and [`UserRepo::count`].
/// Binds: `$1` role, `$2` search, `$3` active_only.
const FILTER: &str = "($1::text IS NULL OR role = $1) \
     AND ($2::text IS NULL \
          OR username ILIKE '%' || $2 || '%' \
          OR email ILIKE '%' || $2 || '%' \
          OR full_name ILIKE '%' || $2 || '%') \
     AND (NOT $3 OR is_active = true)";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, full_name, role, major)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.full_name)
            .bind(&input.role)
            .bind(&input.major)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List users matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE {FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&filter.role)
            .bind(&filter.search)
            .bind(filter.active_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count users matching `filter`.
    pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM users WHERE {FILTER}");
        sqlx::query_scalar(&query)
            .bind(&filter.role)
            .bind(&filter.search)
            .bind(filter.active_only)
            .fetch_one(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                full_name = COALESCE($4, full_name),
                major = COALESCE($5, major),
                role = COALESCE($6, role)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.full_name)
            .bind(&input.major)
            .bind(&input.role)
            .fetch_optional(pool)
            .await
    }

    /// Set `is_active`. Returns `None` if the user does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored password hash.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the user's avatar at a stored upload path.
    pub async fn update_avatar(
        pool: &PgPool,
        id: DbId,
        avatar: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET avatar = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(avatar)
            .fetch_optional(pool)
            .await
    }

    /// Record a successful login.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Counts of non-archived projects the user owns or belongs to.
    ///
    /// A project the user owns is counted once, as owned, even if a
    /// membership row also exists for them.
    pub async fn project_stats(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<UserProjectStats, sqlx::Error> {
        sqlx::query_as::<_, UserProjectStats>(
            "SELECT
                COUNT(*) AS total_projects,
                COUNT(*) FILTER (WHERE p.owner_id = $1) AS owned_projects,
                COUNT(*) FILTER (WHERE p.owner_id <> $1) AS member_projects
             FROM projects p
             WHERE p.is_archived = false
               AND (p.owner_id = $1 OR EXISTS (
                    SELECT 1 FROM project_members pm
                    WHERE pm.project_id = p.id AND pm.user_id = $1))",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
