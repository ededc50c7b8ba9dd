/// Project model and database operations
///
/// A project is created by a producer or studio, starts as `draft`, and owns
/// genres, instrument needs, invitations and sessions.
///
/// # Lifecycle
///
/// ```text
/// draft ──► open ──► in_progress ──► completed
///   │        │            │
///   └────────┴────────────┴──► cancelled
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::catalog::Genre;
use super::status::StatusLifecycle;
use super::Pagination;

const PROJECT_COLUMNS: &str = "id, title, description, creator_id, status, start_date, end_date, \
     budget_cents, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl StatusLifecycle for ProjectStatus {
    const ENTITY: &'static str = "project";

    fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Open => "open",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }

    fn can_transition_to(&self, target: ProjectStatus) -> bool {
        use ProjectStatus::*;

        matches!(
            (self, target),
            (Draft, Open)
                | (Draft, Cancelled)
                | (Open, InProgress)
                | (Open, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
}

/// `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
}

/// An instrument the project needs, joined with its catalog name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectInstrument {
    pub id: Uuid,
    pub project_id: Uuid,
    pub instrument_id: Uuid,
    pub instrument_name: String,
    pub requirements: Option<String>,
    pub filled: bool,
}

/// Returns false when both dates are set and the end precedes the start
pub fn dates_in_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}

impl Project {
    pub async fn create(
        pool: &PgPool,
        creator_id: Uuid,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO projects (title, description, creator_id, start_date, end_date, budget_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(creator_id)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.budget_cents)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects the user created or was invited to, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<ProjectStatus>,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            WHERE (p.creator_id = $1
                   OR EXISTS (SELECT 1 FROM project_invitations pi
                              WHERE pi.project_id = p.id AND pi.musician_id = $1))
              AND ($2::project_status IS NULL OR p.status = $2)
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Whether the user created the project or holds an invitation to it
    pub async fn is_member(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM projects p
                WHERE p.id = $1
                  AND (p.creator_id = $2
                       OR EXISTS (SELECT 1 FROM project_invitations pi
                                  WHERE pi.project_id = p.id AND pi.musician_id = $2))
            )
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                budget_cents = COALESCE($6, budget_cents),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.budget_cents)
            .fetch_optional(pool)
            .await
    }

    /// Moves the project from `from` to `to`
    ///
    /// Returns `None` if the project is no longer in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE projects
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }

    /// Deletes the project with its sessions, invitations and needs
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn genres(pool: &PgPool, id: Uuid) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.created_at, g.updated_at
            FROM project_genres pg
            JOIN genres g ON g.id = pg.genre_id
            WHERE pg.project_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Replaces the project's genres
    pub async fn set_genres(pool: &PgPool, id: Uuid, genre_ids: &[Uuid]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM project_genres WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for genre_id in genre_ids {
            sqlx::query(
                r#"
                INSERT INTO project_genres (project_id, genre_id)
                VALUES ($1, $2)
                ON CONFLICT (project_id, genre_id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    pub async fn instruments(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Vec<ProjectInstrument>, sqlx::Error> {
        sqlx::query_as::<_, ProjectInstrument>(
            r#"
            SELECT pi.id, pi.project_id, pi.instrument_id, i.name AS instrument_name,
                   pi.requirements, pi.filled
            FROM project_instruments pi
            JOIN instruments i ON i.id = pi.instrument_id
            WHERE pi.project_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Adds an instrument need, replacing the requirements if it already exists
    pub async fn add_instrument(
        pool: &PgPool,
        id: Uuid,
        instrument_id: Uuid,
        requirements: Option<String>,
    ) -> Result<ProjectInstrument, sqlx::Error> {
        sqlx::query_as::<_, ProjectInstrument>(
            r#"
            WITH upserted AS (
                INSERT INTO project_instruments (project_id, instrument_id, requirements)
                VALUES ($1, $2, $3)
                ON CONFLICT (project_id, instrument_id)
                DO UPDATE SET requirements = EXCLUDED.requirements, updated_at = NOW()
                RETURNING id, project_id, instrument_id, requirements, filled
            )
            SELECT u.id, u.project_id, u.instrument_id, i.name AS instrument_name,
                   u.requirements, u.filled
            FROM upserted u
            JOIN instruments i ON i.id = u.instrument_id
            "#,
        )
        .bind(id)
        .bind(instrument_id)
        .bind(requirements)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_transitions() {
        use ProjectStatus::*;

        assert!(Draft.can_transition_to(Open));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Open.can_transition_to(Draft));
        assert!(!Completed.can_transition_to(Open));
        assert!(!Cancelled.can_transition_to(Draft));
    }

    #[test]
    fn test_project_terminal_states() {
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Cancelled.is_terminal());
        assert!(!ProjectStatus::Draft.is_terminal());
        assert!(!ProjectStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_project_status_wire_format() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(ProjectStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn test_ensure_transition_error() {
        let err = ProjectStatus::Completed
            .ensure_transition(ProjectStatus::Open)
            .unwrap_err();
        assert_eq!(err.entity, "project");
        assert_eq!(err.from, "completed");
        assert_eq!(err.to, "open");
    }

    #[test]
    fn test_dates_in_order() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1);
        let end = NaiveDate::from_ymd_opt(2025, 3, 20);

        assert!(dates_in_order(start, end));
        assert!(dates_in_order(start, start));
        assert!(!dates_in_order(end, start));
        assert!(dates_in_order(None, start));
        assert!(dates_in_order(end, None));
    }
}
