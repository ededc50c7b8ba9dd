/// Session participants
///
/// A musician can be attached to a session once per instrument. The musician
/// confirms or declines; the organizer later marks the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::status::StatusLifecycle;

const PARTICIPANT_COLUMNS: &str =
    "id, session_id, musician_id, instrument_id, status, rate_cents, notes, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Invited,
    Confirmed,
    Declined,
    Completed,
    NoShow,
}

impl ParticipantStatus {
    pub const ALL: [ParticipantStatus; 5] = [
        ParticipantStatus::Invited,
        ParticipantStatus::Confirmed,
        ParticipantStatus::Declined,
        ParticipantStatus::Completed,
        ParticipantStatus::NoShow,
    ];

    /// States from which `target` is reachable
    pub fn sources_of(target: ParticipantStatus) -> Vec<ParticipantStatus> {
        Self::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(target))
            .collect()
    }
}

impl StatusLifecycle for ParticipantStatus {
    const ENTITY: &'static str = "participant";

    fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Invited => "invited",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Declined => "declined",
            ParticipantStatus::Completed => "completed",
            ParticipantStatus::NoShow => "no_show",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ParticipantStatus::Declined | ParticipantStatus::Completed | ParticipantStatus::NoShow
        )
    }

    fn can_transition_to(&self, target: ParticipantStatus) -> bool {
        use ParticipantStatus::*;

        matches!(
            (self, target),
            (Invited, Confirmed)
                | (Invited, Declined)
                | (Confirmed, Declined)
                | (Confirmed, Completed)
                | (Confirmed, NoShow)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub session_id: Uuid,
    pub musician_id: Uuid,
    pub instrument_id: Uuid,
    pub status: ParticipantStatus,
    pub rate_cents: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Participant joined with musician and instrument names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ParticipantDetails {
    pub id: Uuid,
    pub musician_id: Uuid,
    pub musician_name: String,
    pub instrument_id: Uuid,
    pub instrument_name: String,
    pub status: ParticipantStatus,
    pub rate_cents: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AddParticipant {
    pub musician_id: Uuid,
    pub instrument_id: Uuid,
    pub rate_cents: Option<i64>,
    pub notes: Option<String>,
}

impl Participant {
    /// Attaches a musician to a session as `invited`
    ///
    /// # Errors
    ///
    /// A unique violation if the musician already holds this instrument slot.
    pub async fn add(
        pool: &PgPool,
        session_id: Uuid,
        data: AddParticipant,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO session_musicians (session_id, musician_id, instrument_id, rate_cents, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .bind(data.musician_id)
            .bind(data.instrument_id)
            .bind(data.rate_cents)
            .bind(data.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PARTICIPANT_COLUMNS} FROM session_musicians WHERE id = $1");

        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_session(
        pool: &PgPool,
        session_id: Uuid,
    ) -> Result<Vec<ParticipantDetails>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantDetails>(
            r#"
            SELECT sm.id, sm.musician_id, u.first_name || ' ' || u.last_name AS musician_name,
                   sm.instrument_id, i.name AS instrument_name,
                   sm.status, sm.rate_cents, sm.notes
            FROM session_musicians sm
            JOIN users u ON u.id = sm.musician_id
            JOIN instruments i ON i.id = sm.instrument_id
            WHERE sm.session_id = $1
            ORDER BY sm.created_at
            "#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    /// Distinct musicians attached to a session
    pub async fn musician_ids(pool: &PgPool, session_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT musician_id FROM session_musicians WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Applies a musician's answer to every slot they hold in the session
    ///
    /// Only rows currently in a state that can reach `to` are changed; the
    /// changed rows are returned.
    pub async fn respond(
        pool: &PgPool,
        session_id: Uuid,
        musician_id: Uuid,
        to: ParticipantStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sources: Vec<String> = ParticipantStatus::sources_of(to)
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let query = format!(
            r#"
            UPDATE session_musicians
            SET status = $3, updated_at = NOW()
            WHERE session_id = $1 AND musician_id = $2 AND status::text = ANY($4)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .bind(musician_id)
            .bind(to)
            .bind(sources)
            .fetch_all(pool)
            .await
    }

    /// Moves one participant row from `from` to `to`
    ///
    /// Returns `None` if the row is no longer in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: ParticipantStatus,
        to: ParticipantStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE session_musicians
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }
}
