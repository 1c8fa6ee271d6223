//! Repository for the `projects` and `project_members` tables.

use projecthub_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, ProjectFilter, ProjectMember, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, start_date, end_date, status, priority, owner_id, \
                       progress, budget, is_archived, created_at, updated_at";

/// Shared WHERE clause for [`ProjectRepo::list`] and [`ProjectRepo::count`].
/// Binds: `$1` status, `$2` search, `$3` visible_to.
const FILTER: &str = "is_archived = false \
     AND ($1::text IS NULL OR status = $1) \
     AND ($2::text IS NULL \
          OR name ILIKE '%' || $2 || '%' \
          OR description ILIKE '%' || $2 || '%') \
     AND ($3::bigint IS NULL \
          OR owner_id = $3 \
          OR EXISTS (SELECT 1 FROM project_members pm \
                     WHERE pm.project_id = projects.id AND pm.user_id = $3))";

const MEMBER_COLUMNS: &str = "u.id, u.username, u.email, u.full_name, u.role, u.avatar";

/// Provides CRUD and membership operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_id`, returning the created row.
    ///
    /// The owner and every id in `input.members` get a membership row in
    /// the same transaction. Duplicate ids are ignored.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects
                (name, description, start_date, end_date, status, priority, owner_id, progress, budget)
             VALUES ($1, $2, $3, $4,
                     COALESCE($5, 'Not Started'), COALESCE($6, 'Medium'),
                     $7, COALESCE($8, 0), COALESCE($9, 0))
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(owner_id)
            .bind(input.progress)
            .bind(input.budget)
            .fetch_one(&mut *tx)
            .await?;

        let mut member_ids = Vec::with_capacity(input.members.len() + 1);
        member_ids.push(owner_id);
        member_ids.extend(input.members.iter().copied());

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id)
             SELECT $1, UNNEST($2::bigint[])
             ON CONFLICT DO NOTHING",
        )
        .bind(project.id)
        .bind(&member_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Find a non-archived project by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND is_archived = false");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List non-archived projects matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE {FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&filter.status)
            .bind(&filter.search)
            .bind(filter.visible_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count non-archived projects matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM projects WHERE {FILTER}");
        sqlx::query_scalar(&query)
            .bind(&filter.status)
            .bind(&filter.search)
            .bind(filter.visible_to)
            .fetch_one(pool)
            .await
    }

    /// All non-archived projects the user owns or belongs to, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let filter = ProjectFilter {
            visible_to: Some(user_id),
            ..Default::default()
        };
        Self::list(pool, &filter, i64::MAX, 0).await
    }

    /// IDs of every non-archived project the user owns or belongs to.
    pub async fn ids_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT p.id FROM projects p
             WHERE p.is_archived = false
               AND (p.owner_id = $1 OR EXISTS (
                    SELECT 1 FROM project_members pm
                    WHERE pm.project_id = p.id AND pm.user_id = $1))
             ORDER BY p.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no non-archived row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                progress = COALESCE($8, progress),
                budget = COALESCE($9, budget)
             WHERE id = $1 AND is_archived = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.status)
            .bind(&input.priority)
            .bind(input.progress)
            .bind(input.budget)
            .fetch_optional(pool)
            .await
    }

    /// Archive a project. Returns `true` if a row was archived.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET is_archived = true WHERE id = $1 AND is_archived = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Whether `user_id` has a membership row for the project.
    ///
    /// Callers that need "owner counts as member" semantics combine this
    /// with the project's `owner_id`.
    pub async fn is_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Every user with access to the project: the owner plus all members,
    /// without duplicates.
    pub async fn participant_ids(pool: &PgPool, project_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM project_members WHERE project_id = $1
             UNION
             SELECT owner_id FROM projects WHERE id = $1
             ORDER BY 1",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Member users of a project, in the order they were added.
    pub async fn members(pool: &PgPool, project_id: DbId) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = $1
             ORDER BY pm.created_at, u.id"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The project's owner as a member record.
    pub async fn owner(pool: &PgPool, project_id: DbId) -> Result<Option<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM projects p
             JOIN users u ON u.id = p.owner_id
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a member. Returns `false` if they were already a member.
    pub async fn add_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a member. Returns `false` if they were not a member.
    pub async fn remove_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
