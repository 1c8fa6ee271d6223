//! Repository for the `comments` table.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{Comment, CommentView, CreateComment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, entity_type, entity_id, user_id, content, parent_id, attachments, \
                       is_deleted, created_at, updated_at";

/// Comment columns joined with the author, aliased `c` and `u`.
const VIEW_COLUMNS: &str = "c.id, c.entity_type, c.entity_id, c.user_id, c.content, c.parent_id, \
                            c.attachments, c.created_at, c.updated_at, \
                            u.username AS author_username, u.full_name AS author_full_name, \
                            u.avatar AS author_avatar";

/// Provides CRUD operations for comments. Deleted comments are hidden from
/// every read.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment authored by `user_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateComment,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (entity_type, entity_id, user_id, content, parent_id, attachments)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(user_id)
            .bind(input.content.trim())
            .bind(input.parent_id)
            .bind(serde_json::json!(input.attachments))
            .fetch_one(pool)
            .await
    }

    /// Find a live comment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1 AND is_deleted = false");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live comment by ID, joined with its author.
    pub async fn find_view_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.id = $1 AND c.is_deleted = false"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Top-level comments on an entity, newest first.
    pub async fn list_top_level(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.entity_type = $1 AND c.entity_id = $2
               AND c.parent_id IS NULL AND c.is_deleted = false
             ORDER BY c.created_at DESC, c.id DESC"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    /// Replies to any of `parent_ids`, oldest first.
    pub async fn list_replies(
        pool: &PgPool,
        parent_ids: &[DbId],
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.parent_id = ANY($1) AND c.is_deleted = false
             ORDER BY c.created_at ASC, c.id ASC"
        );
        sqlx::query_as::<_, CommentView>(&query)
            .bind(parent_ids)
            .fetch_all(pool)
            .await
    }

    /// Replace a comment's text. Returns `None` if the comment is gone.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET content = $2
             WHERE id = $1 AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(content.trim())
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a comment together with its replies.
    ///
    /// Returns the number of comments marked deleted.
    pub async fn soft_delete_with_replies(pool: &PgPool, id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE comments SET is_deleted = true
             WHERE (id = $1 OR parent_id = $1) AND is_deleted = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
