/// Recording sessions
///
/// A session belongs to a project; the project's creator organizes it. Rows
/// are always returned with `organizer_id` joined from the project so callers
/// can authorize without a second query.
///
/// # Lifecycle
///
/// ```text
/// scheduled ──► in_progress ──► completed
///     │              │
///     └──────────────┴──► cancelled
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::status::StatusLifecycle;
use super::Pagination;

const SESSION_SELECT: &str = "s.id, s.project_id, p.creator_id AS organizer_id, s.title, \
     s.description, s.start_time, s.end_time, s.location, s.status, s.notes, s.created_at, \
     s.updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl StatusLifecycle for SessionStatus {
    const ENTITY: &'static str = "session";

    fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    fn can_transition_to(&self, target: SessionStatus) -> bool {
        use SessionStatus::*;

        matches!(
            (self, target),
            (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub project_id: Uuid,

    /// Creator of the owning project
    pub organizer_id: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateSession {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl Session {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Creates a scheduled session
    ///
    /// # Errors
    ///
    /// A check violation (`sessions_time_check`) if the end is not after the start.
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            WITH s AS (
                INSERT INTO sessions (project_id, title, description, start_time, end_time,
                                      location, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {SESSION_SELECT}
            FROM s
            JOIN projects p ON p.id = s.project_id
            "#
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.location)
            .bind(data.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {SESSION_SELECT} FROM sessions s JOIN projects p ON p.id = s.project_id \
             WHERE s.id = $1"
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Sessions the user organizes or takes part in, soonest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<SessionStatus>,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SESSION_SELECT}
            FROM sessions s
            JOIN projects p ON p.id = s.project_id
            WHERE (p.creator_id = $1
                   OR EXISTS (SELECT 1 FROM session_musicians sm
                              WHERE sm.session_id = s.id AND sm.musician_id = $1))
              AND ($2::session_status IS NULL OR s.status = $2)
            ORDER BY s.start_time
            LIMIT $3 OFFSET $4
            "#
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Scheduled sessions starting in the future
    ///
    /// Participants who declined are excluded.
    pub async fn upcoming_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SESSION_SELECT}
            FROM sessions s
            JOIN projects p ON p.id = s.project_id
            WHERE s.status = 'scheduled'
              AND s.start_time > NOW()
              AND (p.creator_id = $1
                   OR EXISTS (SELECT 1 FROM session_musicians sm
                              WHERE sm.session_id = s.id AND sm.musician_id = $1
                                AND sm.status <> 'declined'))
            ORDER BY s.start_time
            LIMIT $2
            "#
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Whether the user organizes the session or is attached to it
    pub async fn is_member(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM sessions s
                JOIN projects p ON p.id = s.project_id
                WHERE s.id = $1
                  AND (p.creator_id = $2
                       OR EXISTS (SELECT 1 FROM session_musicians sm
                                  WHERE sm.session_id = s.id AND sm.musician_id = $2))
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
        data: UpdateSession,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            WITH s AS (
                UPDATE sessions
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    start_time = COALESCE($4, start_time),
                    end_time = COALESCE($5, end_time),
                    location = COALESCE($6, location),
                    notes = COALESCE($7, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {SESSION_SELECT}
            FROM s
            JOIN projects p ON p.id = s.project_id
            "#
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.start_time)
            .bind(data.end_time)
            .bind(data.location)
            .bind(data.notes)
            .fetch_optional(pool)
            .await
    }

    /// Moves the session from `from` to `to`
    ///
    /// Returns `None` if the session is no longer in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            WITH s AS (
                UPDATE sessions
                SET status = $3, updated_at = NOW()
                WHERE id = $1 AND status = $2
                RETURNING *
            )
            SELECT {SESSION_SELECT}
            FROM s
            JOIN projects p ON p.id = s.project_id
            "#
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
