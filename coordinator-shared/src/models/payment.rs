/// Payment records
///
/// Payments are bookkeeping only: no provider is contacted. The payer drives
/// the status. A failed payment may be retried by moving it back to pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::status::StatusLifecycle;
use super::Pagination;

const PAYMENT_COLUMNS: &str = "id, session_id, project_id, payer_id, payee_id, amount_cents, \
     status, payment_method, transaction_id, notes, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl StatusLifecycle for PaymentStatus {
    const ENTITY: &'static str = "payment";

    fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Refunded)
    }

    fn can_transition_to(&self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;

        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Failed, Pending) | (Completed, Refunded)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub payee_id: Uuid,
    pub amount_cents: i64,
    pub session_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl Payment {
    /// Records a pending payment from `payer_id`
    ///
    /// # Errors
    ///
    /// A check violation when the amount is not positive or the payer pays
    /// themselves.
    pub async fn create(
        pool: &PgPool,
        payer_id: Uuid,
        data: CreatePayment,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO payments (session_id, project_id, payer_id, payee_id, amount_cents,
                                  payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.session_id)
            .bind(data.project_id)
            .bind(payer_id)
            .bind(data.payee_id)
            .bind(data.amount_cents)
            .bind(data.payment_method)
            .bind(data.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Payer and payee
    pub fn parties(&self) -> [Uuid; 2] {
        [self.payer_id, self.payee_id]
    }

    /// Payments the user sent or received, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE (payer_id = $1 OR payee_id = $1)
              AND ($2::payment_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Moves the payment from `from` to `to`, optionally recording a
    /// transaction reference
    ///
    /// Returns `None` if the payment is no longer in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE payments
            SET status = $3,
                transaction_id = COALESCE($4, transaction_id),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }
}
