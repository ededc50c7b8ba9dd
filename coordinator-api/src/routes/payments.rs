/// Payment endpoints
///
/// Payments are records between two users; the payer drives their status.
///
/// # Endpoints
///
/// - `GET /v1/payments?status=pending` - Payments sent or received
/// - `POST /v1/payments` - Record a payment to another user
/// - `GET /v1/payments/recent` - Five most recent payments
/// - `GET /v1/payments/:id` - Payment (payer or payee)
/// - `POST /v1/payments/:id/status` - Change status (payer)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coordinator_shared::{
    auth::{
        authorization::{require_owner, require_participant, AuthzError},
        middleware::AuthContext,
    },
    models::{
        payment::{CreatePayment, Payment, PaymentStatus},
        project::Project,
        session::Session,
        user::User,
        Pagination, StatusLifecycle,
    },
    realtime::{Notification, NotificationKind},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

const RECENT_PAYMENTS: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub payee_id: Uuid,

    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount_cents: i64,

    pub session_id: Option<Uuid>,
    pub project_id: Option<Uuid>,

    #[validate(length(max = 50, message = "Payment method must be at most 50 characters"))]
    pub payment_method: Option<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,

    #[validate(length(min = 1, max = 255, message = "Transaction id must be 1-255 characters"))]
    pub transaction_id: Option<String>,
}

fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

pub async fn list_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let payments = Payment::list_for_user(&state.db, auth.user_id, query.status, page).await?;
    Ok(Json(payments))
}

pub async fn recent_payments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Payment>>> {
    let page = Pagination::new(RECENT_PAYMENTS, 0);

    let payments = Payment::list_for_user(&state.db, auth.user_id, None, page).await?;
    Ok(Json(payments))
}

/// Requires payer and payee to belong to the session and project the payment
/// references
async fn check_payment_context(
    state: &AppState,
    parties: [Uuid; 2],
    req: &CreatePaymentRequest,
) -> ApiResult<()> {
    for user_id in parties {
        if let Some(session_id) = req.session_id {
            if !Session::is_member(&state.db, session_id, user_id).await? {
                return Err(AuthzError::NotParticipant.into());
            }
        }
        if let Some(project_id) = req.project_id {
            if !Project::is_member(&state.db, project_id, user_id).await? {
                return Err(AuthzError::NotParticipant.into());
            }
        }
    }

    Ok(())
}

/// Record a pending payment to another user
///
/// ```text
/// POST /v1/payments
///
/// {
///   "payee_id": "…",
///   "amount_cents": 45000,
///   "session_id": "…",
///   "payment_method": "bank_transfer"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Payer or payee is not part of the referenced session or project
/// - `404 Not Found`: Payee does not exist
/// - `422 Unprocessable Entity`: Amount not positive or paying oneself
pub async fn create_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    if req.payee_id == auth.user_id {
        return Err(ApiError::invalid_field("payee_id", "You cannot pay yourself"));
    }

    if User::find_by_id(&state.db, req.payee_id).await?.is_none() {
        return Err(ApiError::NotFound("Payee not found".to_string()));
    }

    check_payment_context(&state, [auth.user_id, req.payee_id], &req).await?;

    let payment = Payment::create(
        &state.db,
        auth.user_id,
        CreatePayment {
            payee_id: req.payee_id,
            amount_cents: req.amount_cents,
            session_id: req.session_id,
            project_id: req.project_id,
            payment_method: req.payment_method,
            notes: req.notes,
        },
    )
    .await?;

    tracing::info!(
        payment_id = %payment.id,
        payer_id = %payment.payer_id,
        payee_id = %payment.payee_id,
        amount_cents = payment.amount_cents,
        "Payment recorded"
    );

    state
        .notify(
            payment.payee_id,
            Notification::new(
                NotificationKind::Payment,
                payment.id,
                format!("Payment of {} recorded", format_amount(payment.amount_cents)),
            ),
        )
        .await;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Payment>> {
    let payment = Payment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    require_participant(&auth, &payment.parties())?;

    Ok(Json(payment))
}

/// Change payment status
///
/// ```text
/// POST /v1/payments/:id/status
///
/// { "status": "completed", "transaction_id": "TX-2291" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the payer
/// - `409 Conflict`: Transition not allowed, or the status changed meanwhile
pub async fn update_payment_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePaymentStatusRequest>,
) -> ApiResult<Json<Payment>> {
    let payment = Payment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    require_owner(&auth, payment.payer_id)?;
    payment.status.ensure_transition(req.status)?;

    let updated = Payment::transition(
        &state.db,
        id,
        payment.status,
        req.status,
        req.transaction_id,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Payment status changed concurrently".to_string()))?;

    tracing::info!(
        payment_id = %id,
        from = payment.status.as_str(),
        to = updated.status.as_str(),
        "Payment status changed"
    );

    state
        .notify(
            updated.payee_id,
            Notification::new(
                NotificationKind::Payment,
                updated.id,
                format!(
                    "Payment of {} is now {}",
                    format_amount(updated.amount_cents),
                    updated.status.as_str()
                ),
            ),
        )
        .await;

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(45000), "450.00");
        assert_eq!(format_amount(1999), "19.99");
        assert_eq!(format_amount(5), "0.05");
    }
}
