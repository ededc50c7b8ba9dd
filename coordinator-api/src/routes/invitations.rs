/// Project invitation endpoints
///
/// # Endpoints
///
/// - `GET /v1/projects/:id/invitations` - Invitations sent for a project (creator)
/// - `POST /v1/projects/:id/invitations` - Invite a musician (creator)
/// - `GET /v1/invitations?status=pending` - Invitations the caller received
/// - `POST /v1/invitations/:id/respond` - Accept or decline (invitee)
/// - `POST /v1/invitations/:id/cancel` - Withdraw (creator)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ValidatedJson},
    routes::projects::{find_owned_project, find_project},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coordinator_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    models::{
        invitation::{CreateInvitation, Invitation, InvitationDetails, InvitationStatus},
        user::{User, UserType},
        StatusLifecycle,
    },
    realtime::{Notification, NotificationKind},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    pub musician_id: Uuid,
    pub instrument_id: Uuid,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,

    #[validate(range(min = 0, message = "Rate cannot be negative"))]
    pub rate_cents: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvitationQuery {
    pub status: Option<InvitationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: InvitationStatus,
}

async fn find_invitation(state: &AppState, id: Uuid) -> ApiResult<Invitation> {
    Invitation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))
}

/// Applies a pending-state change, mapping a lost race to 409
async fn apply_response(
    state: &AppState,
    invitation: &Invitation,
    to: InvitationStatus,
) -> ApiResult<Invitation> {
    invitation.status.ensure_transition(to)?;

    let updated = Invitation::respond(&state.db, invitation.id, to)
        .await?
        .ok_or_else(|| ApiError::Conflict("Invitation is no longer pending".to_string()))?;

    tracing::info!(
        invitation_id = %updated.id,
        project_id = %updated.project_id,
        status = updated.status.as_str(),
        "Invitation updated"
    );

    Ok(updated)
}

pub async fn list_project_invitations(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<InvitationDetails>>> {
    find_owned_project(&state, &auth, project_id).await?;
    Ok(Json(Invitation::list_for_project(&state.db, project_id).await?))
}

/// Invite a musician to fill an instrument on a project
///
/// ```text
/// POST /v1/projects/:id/invitations
///
/// {
///   "musician_id": "…",
///   "instrument_id": "…",
///   "message": "Need a horn section for two tracks",
///   "rate_cents": 40000
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller did not create the project
/// - `404 Not Found`: Project or musician does not exist
/// - `409 Conflict`: Project is closed, or the musician is already invited for this instrument
/// - `422 Unprocessable Entity`: Invitee is not a musician
pub async fn create_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<Invitation>)> {
    let project = find_owned_project(&state, &auth, project_id).await?;

    if project.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Project is {} and no longer takes invitations",
            project.status.as_str()
        )));
    }

    let musician = User::find_by_id(&state.db, req.musician_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Musician not found".to_string()))?;

    if musician.user_type != UserType::Musician {
        return Err(ApiError::invalid_field(
            "musician_id",
            "Only musicians can be invited",
        ));
    }

    let invitation = Invitation::create(
        &state.db,
        project_id,
        CreateInvitation {
            musician_id: req.musician_id,
            instrument_id: req.instrument_id,
            message: req.message,
            rate_cents: req.rate_cents,
        },
    )
    .await?;

    tracing::info!(
        invitation_id = %invitation.id,
        project_id = %project_id,
        musician_id = %invitation.musician_id,
        "Musician invited"
    );

    state
        .notify(
            invitation.musician_id,
            Notification::new(
                NotificationKind::ProjectInvitation,
                invitation.id,
                format!("You were invited to join '{}'", project.title),
            ),
        )
        .await;

    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn list_my_invitations(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<InvitationQuery>,
) -> ApiResult<Json<Vec<InvitationDetails>>> {
    let invitations =
        Invitation::list_for_musician(&state.db, auth.user_id, query.status).await?;
    Ok(Json(invitations))
}

/// Accept or decline an invitation
///
/// ```text
/// POST /v1/invitations/:id/respond
///
/// { "status": "accepted" }
/// ```
///
/// Accepting marks the project's need for the instrument as filled.
pub async fn respond_to_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<RespondRequest>,
) -> ApiResult<Json<Invitation>> {
    if !matches!(
        req.status,
        InvitationStatus::Accepted | InvitationStatus::Declined
    ) {
        return Err(ApiError::invalid_field(
            "status",
            "Response must be 'accepted' or 'declined'",
        ));
    }

    let invitation = find_invitation(&state, id).await?;
    require_owner(&auth, invitation.musician_id)?;

    let updated = apply_response(&state, &invitation, req.status).await?;

    let project = find_project(&state, updated.project_id).await?;
    state
        .notify(
            project.creator_id,
            Notification::new(
                NotificationKind::InvitationResponse,
                updated.id,
                format!(
                    "Invitation to '{}' was {}",
                    project.title,
                    updated.status.as_str()
                ),
            ),
        )
        .await;

    Ok(Json(updated))
}

/// Withdraw a pending invitation
pub async fn cancel_invitation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invitation>> {
    let invitation = find_invitation(&state, id).await?;
    let project = find_owned_project(&state, &auth, invitation.project_id).await?;

    let updated = apply_response(&state, &invitation, InvitationStatus::Cancelled).await?;

    state
        .notify(
            updated.musician_id,
            Notification::new(
                NotificationKind::ProjectInvitation,
                updated.id,
                format!("Invitation to '{}' was withdrawn", project.title),
            ),
        )
        .await;

    Ok(Json(updated))
}
