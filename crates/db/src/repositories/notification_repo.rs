//! Repository for the `notifications` table.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, type, title, message, is_read, read_at, \
                       related_entity_type, related_entity_id, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a single unread notification, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications
                (user_id, type, title, message, related_entity_type, related_entity_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(&input.kind)
            .bind(&input.title)
            .bind(&input.message)
            .bind(&input.related_entity_type)
            .bind(input.related_entity_id)
            .fetch_one(pool)
            .await
    }

    /// Insert many notifications in one statement, returning the stored
    /// rows in input order.
    pub async fn create_bulk(
        pool: &PgPool,
        inputs: &[CreateNotification],
    ) -> Result<Vec<Notification>, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<DbId> = inputs.iter().map(|n| n.user_id).collect();
        let kinds: Vec<&str> = inputs.iter().map(|n| n.kind.as_str()).collect();
        let titles: Vec<&str> = inputs.iter().map(|n| n.title.as_str()).collect();
        let messages: Vec<&str> = inputs.iter().map(|n| n.message.as_str()).collect();
        let entity_types: Vec<Option<String>> = inputs
            .iter()
            .map(|n| n.related_entity_type.clone())
            .collect();
        let entity_ids: Vec<Option<DbId>> = inputs.iter().map(|n| n.related_entity_id).collect();

        let query = format!(
            "INSERT INTO notifications
                (user_id, type, title, message, related_entity_type, related_entity_id)
             SELECT * FROM UNNEST(
                $1::bigint[], $2::text[], $3::text[], $4::text[], $5::text[], $6::bigint[]
             )
             RETURNING {COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Notification>(&query)
            .bind(&user_ids)
            .bind(&kinds)
            .bind(&titles)
            .bind(&messages)
            .bind(&entity_types)
            .bind(&entity_ids)
            .fetch_all(pool)
            .await?;
        rows.sort_by_key(|n| n.id);
        Ok(rows)
    }

    /// List notifications for a user, newest first.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count the rows [`list_for_user`](Self::list_for_user) pages over.
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!("SELECT COUNT(*) FROM notifications WHERE user_id = $1 {filter}");
        sqlx::query_scalar(&query).bind(user_id).fetch_one(pool).await
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        Self::count_for_user(pool, user_id, true).await
    }

    /// Mark a single notification as read.
    ///
    /// Returns the row if it belongs to `user_id` (already-read rows are
    /// returned unchanged), `None` otherwise.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one of the user's notifications. Returns `true` if removed.
    pub async fn delete(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete read notifications created more than `days_old` days ago.
    ///
    /// Returns the number of rows removed.
    pub async fn purge_read_older_than(pool: &PgPool, days_old: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE is_read = true \
               AND created_at < NOW() - make_interval(days => $1::int)",
        )
        .bind(days_old)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
