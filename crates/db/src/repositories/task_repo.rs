//! Repository for the `tasks` table.

use projecthub_core::status::TaskStatus;
use projecthub_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::task::{CreateTask, ReminderCandidate, Task, TaskFilter, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, description, due_date, status, priority, \
                       assigned_to_id, created_by_id, hours, attachments, \
                       completion_requested_at, reminder_sent_at, overdue_notified_at, \
                       created_at, updated_at";

/// Same columns qualified with the `t` alias, for joins.
const T_COLUMNS: &str = "t.id, t.project_id, t.name, t.description, t.due_date, t.status, \
                         t.priority, t.assigned_to_id, t.created_by_id, t.hours, t.attachments, \
                         t.completion_requested_at, t.reminder_sent_at, t.overdue_notified_at, \
                         t.created_at, t.updated_at";

/// Provides CRUD and workflow operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task created by `created_by_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        created_by_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks
                (project_id, name, description, due_date, status, priority,
                 assigned_to_id, created_by_id, hours, attachments)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'To Do'), COALESCE($6, 'Medium'),
                     $7, $8, COALESCE($9, 0), $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.assigned_to_id)
            .bind(created_by_id)
            .bind(input.hours)
            .bind(&input.attachments)
            .fetch_one(pool)
            .await
    }

    /// Find a task by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's tasks matching `filter`, soonest due first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE project_id = $1
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR priority = $3)
               AND ($4::bigint IS NULL OR assigned_to_id = $4)
             ORDER BY due_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.assigned_to_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks assigned to `user_id` in non-archived projects, soonest due first.
    pub async fn list_for_assignee(pool: &PgPool, user_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {T_COLUMNS} FROM tasks t
             JOIN projects p ON p.id = t.project_id
             WHERE t.assigned_to_id = $1 AND p.is_archived = false
             ORDER BY t.due_date ASC NULLS LAST, t.id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a task. Only non-`None` fields in `input` are applied.
    ///
    /// Changing the due date re-arms the due-soon and overdue reminders.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                reminder_sent_at = CASE WHEN $4::timestamptz IS NOT NULL
                                         AND $4 IS DISTINCT FROM due_date
                                        THEN NULL ELSE reminder_sent_at END,
                overdue_notified_at = CASE WHEN $4::timestamptz IS NOT NULL
                                            AND $4 IS DISTINCT FROM due_date
                                           THEN NULL ELSE overdue_notified_at END,
                due_date = COALESCE($4, due_date),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                assigned_to_id = COALESCE($7, assigned_to_id),
                hours = COALESCE($8, hours),
                attachments = COALESCE($9, attachments)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.assigned_to_id)
            .bind(input.hours)
            .bind(&input.attachments)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the assignee.
    pub async fn set_assignee(
        pool: &PgPool,
        id: DbId,
        assignee_id: Option<DbId>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query =
            format!("UPDATE tasks SET assigned_to_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(pool)
            .await
    }

    /// Move the task to `status`.
    ///
    /// Entering `In Review` stamps `completion_requested_at`; any other
    /// status clears it.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                status = $2,
                completion_requested_at = CASE WHEN $2 = 'In Review' THEN NOW() ELSE NULL END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a task. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reminders
    // -----------------------------------------------------------------------

    /// Assigned, unfinished tasks in live projects due in `[from, to)` that
    /// have not had a due-soon reminder yet.
    pub async fn due_for_reminder(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ReminderCandidate>, sqlx::Error> {
        sqlx::query_as::<_, ReminderCandidate>(
            "SELECT t.id AS task_id, t.name AS task_name, t.project_id, t.due_date,
                    u.id AS assignee_id, u.email AS assignee_email, u.full_name AS assignee_name
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             JOIN users u ON u.id = t.assigned_to_id
             WHERE t.status <> 'Done'
               AND t.reminder_sent_at IS NULL
               AND t.due_date >= $1 AND t.due_date < $2
               AND p.is_archived = false
               AND u.is_active = true
             ORDER BY t.due_date, t.id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Assigned, unfinished tasks in live projects whose due date is before
    /// `now` and that have not had an overdue notice yet.
    pub async fn overdue_unnotified(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<ReminderCandidate>, sqlx::Error> {
        sqlx::query_as::<_, ReminderCandidate>(
            "SELECT t.id AS task_id, t.name AS task_name, t.project_id, t.due_date,
                    u.id AS assignee_id, u.email AS assignee_email, u.full_name AS assignee_name
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             JOIN users u ON u.id = t.assigned_to_id
             WHERE t.status <> 'Done'
               AND t.overdue_notified_at IS NULL
               AND t.due_date < $1
               AND p.is_archived = false
               AND u.is_active = true
             ORDER BY t.due_date, t.id",
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_reminder_sent(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET reminder_sent_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_overdue_notified(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET overdue_notified_at = NOW() WHERE id = ANY($1)")
                .bind(ids)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
