/// Project invitations
///
/// An invitation asks one musician to fill one instrument on a project.
/// Only `pending` invitations can change: the musician accepts or declines,
/// the project creator cancels. Accepting marks the project's need for that
/// instrument as filled in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::status::StatusLifecycle;

const INVITATION_COLUMNS: &str =
    "id, project_id, musician_id, instrument_id, status, message, rate_cents, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

impl StatusLifecycle for InvitationStatus {
    const ENTITY: &'static str = "invitation";

    fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Cancelled => "cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }

    fn can_transition_to(&self, target: InvitationStatus) -> bool {
        *self == InvitationStatus::Pending && target != InvitationStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub musician_id: Uuid,
    pub instrument_id: Uuid,
    pub status: InvitationStatus,
    pub message: Option<String>,
    pub rate_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invitation joined with project, musician and instrument names for listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvitationDetails {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_title: String,
    pub musician_id: Uuid,
    pub musician_name: String,
    pub instrument_id: Uuid,
    pub instrument_name: String,
    pub status: InvitationStatus,
    pub message: Option<String>,
    pub rate_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub musician_id: Uuid,
    pub instrument_id: Uuid,
    pub message: Option<String>,
    pub rate_cents: Option<i64>,
}

const DETAILS_SELECT: &str = r#"
    SELECT pi.id, pi.project_id, p.title AS project_title,
           pi.musician_id, u.first_name || ' ' || u.last_name AS musician_name,
           pi.instrument_id, i.name AS instrument_name,
           pi.status, pi.message, pi.rate_cents, pi.created_at
    FROM project_invitations pi
    JOIN projects p ON p.id = pi.project_id
    JOIN users u ON u.id = pi.musician_id
    JOIN instruments i ON i.id = pi.instrument_id
"#;

impl Invitation {
    /// Creates a pending invitation
    ///
    /// # Errors
    ///
    /// A unique violation if the musician is already invited for this
    /// instrument on the project.
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        data: CreateInvitation,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO project_invitations (project_id, musician_id, instrument_id, message, rate_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INVITATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Invitation>(&query)
            .bind(project_id)
            .bind(data.musician_id)
            .bind(data.instrument_id)
            .bind(data.message)
            .bind(data.rate_cents)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM project_invitations WHERE id = $1");

        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<InvitationDetails>, sqlx::Error> {
        let query = format!("{DETAILS_SELECT} WHERE pi.project_id = $1 ORDER BY pi.created_at DESC");

        sqlx::query_as::<_, InvitationDetails>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Invitations a musician received, optionally filtered by status
    pub async fn list_for_musician(
        pool: &PgPool,
        musician_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<InvitationDetails>, sqlx::Error> {
        let query = format!(
            "{DETAILS_SELECT} WHERE pi.musician_id = $1 \
             AND ($2::invitation_status IS NULL OR pi.status = $2) \
             ORDER BY pi.created_at DESC"
        );

        sqlx::query_as::<_, InvitationDetails>(&query)
            .bind(musician_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Moves a pending invitation to `to`
    ///
    /// Accepting also marks the matching project instrument as filled.
    /// Returns `None` if the invitation is no longer pending.
    pub async fn respond(
        pool: &PgPool,
        id: Uuid,
        to: InvitationStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            r#"
            UPDATE project_invitations
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {INVITATION_COLUMNS}
            "#
        );

        let invitation = sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .bind(InvitationStatus::Pending)
            .bind(to)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(invitation) = invitation else {
            return Ok(None);
        };

        if invitation.status == InvitationStatus::Accepted {
            sqlx::query(
                r#"
                UPDATE project_instruments
                SET filled = TRUE, updated_at = NOW()
                WHERE project_id = $1 AND instrument_id = $2
                "#,
            )
            .bind(invitation.project_id)
            .bind(invitation.instrument_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(invitation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_can_change() {
        use InvitationStatus::*;

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Declined));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));

        for terminal in [Accepted, Declined, Cancelled] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Pending));
            assert!(!terminal.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn test_invitation_status_serde() {
        let parsed: InvitationStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(parsed, InvitationStatus::Accepted);
    }
}
