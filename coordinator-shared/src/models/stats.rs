/// Dashboard aggregates for one user

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    /// Sessions organized or joined, any status
    pub total_sessions: i64,

    /// Project invitations awaiting the user's answer
    pub pending_invitations: i64,

    /// Scheduled future sessions, excluding ones the user declined
    pub upcoming_sessions: i64,

    /// Pending payments sent or received
    pub pending_payments: i64,

    /// Completed payments received
    pub total_earnings_cents: i64,

    pub completed_sessions: i64,
}

impl DashboardStats {
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            r#"
            WITH my_sessions AS (
                SELECT s.id, s.status, s.start_time,
                       p.creator_id = $1
                       OR EXISTS (SELECT 1 FROM session_musicians sm
                                  WHERE sm.session_id = s.id AND sm.musician_id = $1
                                    AND sm.status <> 'declined') AS attending
                FROM sessions s
                JOIN projects p ON p.id = s.project_id
                WHERE p.creator_id = $1
                   OR EXISTS (SELECT 1 FROM session_musicians sm
                              WHERE sm.session_id = s.id AND sm.musician_id = $1)
            )
            SELECT
                (SELECT COUNT(*) FROM my_sessions) AS total_sessions,
                (SELECT COUNT(*) FROM project_invitations
                 WHERE musician_id = $1 AND status = 'pending') AS pending_invitations,
                (SELECT COUNT(*) FROM my_sessions
                 WHERE status = 'scheduled' AND start_time > NOW() AND attending) AS upcoming_sessions,
                (SELECT COUNT(*) FROM payments
                 WHERE (payer_id = $1 OR payee_id = $1) AND status = 'pending') AS pending_payments,
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments
                 WHERE payee_id = $1 AND status = 'completed') AS total_earnings_cents,
                (SELECT COUNT(*) FROM my_sessions WHERE status = 'completed') AS completed_sessions
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
