/// Recording session endpoints
///
/// # Endpoints
///
/// - `GET /v1/sessions` - Sessions the caller organizes or plays in
/// - `POST /v1/sessions` - Schedule a session on an own project
/// - `GET /v1/sessions/upcoming` - Next scheduled sessions
/// - `GET /v1/sessions/:id` - Session with participants
/// - `PUT /v1/sessions/:id` - Update (organizer)
/// - `DELETE /v1/sessions/:id` - Delete (organizer)
/// - `POST /v1/sessions/:id/status` - Change status (organizer)
/// - `GET /v1/sessions/:id/participants` - Participants
/// - `POST /v1/sessions/:id/participants` - Attach a musician (organizer)
/// - `POST /v1/sessions/:id/respond` - Confirm or decline (musician)
/// - `POST /v1/sessions/:id/participants/:participant_id/status` - Mark outcome (organizer)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ValidatedJson},
    routes::projects::{find_owned_project, StatusRequest},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use coordinator_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    models::{
        participant::{AddParticipant, Participant, ParticipantDetails, ParticipantStatus},
        session::{CreateSession, Session, SessionStatus, UpdateSession},
        user::{User, UserType},
        Pagination, StatusLifecycle,
    },
    realtime::{Notification, NotificationKind},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_UPCOMING: i64 = 10;
const MAX_UPCOMING: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub status: Option<SessionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddParticipantRequest {
    pub musician_id: Uuid,
    pub instrument_id: Uuid,

    #[validate(range(min = 0, message = "Rate cannot be negative"))]
    pub rate_cents: Option<i64>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Session with its participants
#[derive(Debug, Serialize)]
pub struct SessionDetails {
    #[serde(flatten)]
    pub session: Session,

    pub duration_minutes: i64,
    pub participants: Vec<ParticipantDetails>,
}

fn check_times(start: DateTime<Utc>, end: DateTime<Utc>) -> ApiResult<()> {
    if end > start {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "end_time",
            "end_time must be after start_time",
        ))
    }
}

async fn find_session(state: &AppState, id: Uuid) -> ApiResult<Session> {
    Session::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

async fn find_organized_session(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Session> {
    let session = find_session(state, id).await?;
    require_owner(auth, session.organizer_id)?;
    Ok(session)
}

/// Loads a session the caller organizes or is attached to
async fn find_visible_session(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Session> {
    let session = find_session(state, id).await?;

    if session.organizer_id != auth.user_id
        && !Session::is_member(&state.db, id, auth.user_id).await?
    {
        return Err(ApiError::Forbidden(
            "You are not part of this session".to_string(),
        ));
    }

    Ok(session)
}

fn ensure_open(session: &Session) -> ApiResult<()> {
    if session.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Session is {}",
            session.status.as_str()
        )));
    }
    Ok(())
}

pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<Vec<Session>>> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let sessions = Session::list_for_user(&state.db, auth.user_id, query.status, page).await?;
    Ok(Json(sessions))
}

pub async fn upcoming_sessions(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Session>>> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING).clamp(1, MAX_UPCOMING);

    let sessions = Session::upcoming_for_user(&state.db, auth.user_id, limit).await?;
    Ok(Json(sessions))
}

/// Schedule a session
///
/// ```text
/// POST /v1/sessions
///
/// {
///   "project_id": "…",
///   "title": "Drum tracking",
///   "start_time": "2025-07-02T10:00:00Z",
///   "end_time": "2025-07-02T16:00:00Z",
///   "location": "Studio B"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller did not create the project
/// - `409 Conflict`: Project is completed or cancelled
/// - `422 Unprocessable Entity`: End not after start
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    check_times(req.start_time, req.end_time)?;

    let project = find_owned_project(&state, &auth, req.project_id).await?;
    if project.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Project is {}",
            project.status.as_str()
        )));
    }

    let session = Session::create(
        &state.db,
        CreateSession {
            project_id: req.project_id,
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            notes: req.notes,
        },
    )
    .await?;

    tracing::info!(
        session_id = %session.id,
        project_id = %session.project_id,
        start_time = %session.start_time,
        "Session scheduled"
    );

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionDetails>> {
    let session = find_visible_session(&state, &auth, id).await?;
    let participants = Participant::list_for_session(&state.db, id).await?;

    Ok(Json(SessionDetails {
        duration_minutes: session.duration_minutes(),
        session,
        participants,
    }))
}

pub async fn update_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSessionRequest>,
) -> ApiResult<Json<Session>> {
    let current = find_organized_session(&state, &auth, id).await?;
    ensure_open(&current)?;

    check_times(
        req.start_time.unwrap_or(current.start_time),
        req.end_time.unwrap_or(current.end_time),
    )?;

    let session = Session::update(
        &state.db,
        id,
        UpdateSession {
            title: req.title,
            description: req.description,
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            notes: req.notes,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(Json(session))
}

pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    find_organized_session(&state, &auth, id).await?;

    if !Session::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Change session status and tell the participants
///
/// ```text
/// POST /v1/sessions/:id/status
///
/// { "status": "in_progress" }
/// ```
pub async fn update_session_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest<SessionStatus>>,
) -> ApiResult<Json<Session>> {
    let session = find_organized_session(&state, &auth, id).await?;
    session.status.ensure_transition(req.status)?;

    let updated = Session::transition(&state.db, id, session.status, req.status)
        .await?
        .ok_or_else(|| ApiError::Conflict("Session status changed concurrently".to_string()))?;

    tracing::info!(
        session_id = %id,
        from = session.status.as_str(),
        to = updated.status.as_str(),
        "Session status changed"
    );

    let musicians = Participant::musician_ids(&state.db, id).await?;
    state
        .notify_many(
            musicians,
            Notification::new(
                NotificationKind::SessionStatus,
                updated.id,
                format!("'{}' is now {}", updated.title, updated.status.as_str()),
            ),
        )
        .await;

    Ok(Json(updated))
}

pub async fn list_participants(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ParticipantDetails>>> {
    find_visible_session(&state, &auth, id).await?;
    Ok(Json(Participant::list_for_session(&state.db, id).await?))
}

/// Attach a musician to a session as `invited`
///
/// # Errors
///
/// - `409 Conflict`: Session closed, or the musician already holds this instrument slot
/// - `422 Unprocessable Entity`: User is not a musician
pub async fn add_participant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddParticipantRequest>,
) -> ApiResult<(StatusCode, Json<Participant>)> {
    let session = find_organized_session(&state, &auth, id).await?;
    ensure_open(&session)?;

    let musician = User::find_by_id(&state.db, req.musician_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Musician not found".to_string()))?;

    if musician.user_type != UserType::Musician {
        return Err(ApiError::invalid_field(
            "musician_id",
            "Only musicians can join a session",
        ));
    }

    let participant = Participant::add(
        &state.db,
        id,
        AddParticipant {
            musician_id: req.musician_id,
            instrument_id: req.instrument_id,
            rate_cents: req.rate_cents,
            notes: req.notes,
        },
    )
    .await?;

    tracing::info!(
        session_id = %id,
        participant_id = %participant.id,
        musician_id = %participant.musician_id,
        "Participant added"
    );

    state
        .notify(
            participant.musician_id,
            Notification::new(
                NotificationKind::SessionInvitation,
                session.id,
                format!(
                    "You were booked for '{}' on {}",
                    session.title,
                    session.start_time.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
        )
        .await;

    Ok((StatusCode::CREATED, Json(participant)))
}

/// Confirm or decline every slot the caller holds in a session
///
/// ```text
/// POST /v1/sessions/:id/respond
///
/// { "status": "confirmed" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Caller holds no slot in the session
/// - `409 Conflict`: Session closed, or no slot can take the answer
pub async fn respond_to_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest<ParticipantStatus>>,
) -> ApiResult<Json<Vec<Participant>>> {
    if !matches!(
        req.status,
        ParticipantStatus::Confirmed | ParticipantStatus::Declined
    ) {
        return Err(ApiError::invalid_field(
            "status",
            "Response must be 'confirmed' or 'declined'",
        ));
    }

    let session = find_session(&state, id).await?;
    ensure_open(&session)?;

    let updated = Participant::respond(&state.db, id, auth.user_id, req.status).await?;

    if updated.is_empty() {
        let attached = Participant::musician_ids(&state.db, id)
            .await?
            .contains(&auth.user_id);

        return Err(if attached {
            ApiError::Conflict(format!(
                "No slot in this session can be {}",
                req.status.as_str()
            ))
        } else {
            ApiError::NotFound("You are not part of this session".to_string())
        });
    }

    tracing::info!(
        session_id = %id,
        musician_id = %auth.user_id,
        status = req.status.as_str(),
        slots = updated.len(),
        "Session response recorded"
    );

    state
        .notify(
            session.organizer_id,
            Notification::new(
                NotificationKind::ParticipantResponse,
                session.id,
                format!("A musician {} '{}'", req.status.as_str(), session.title),
            ),
        )
        .await;

    Ok(Json(updated))
}

/// Mark a participant `completed` or `no_show`
pub async fn update_participant_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<StatusRequest<ParticipantStatus>>,
) -> ApiResult<Json<Participant>> {
    if !matches!(
        req.status,
        ParticipantStatus::Completed | ParticipantStatus::NoShow
    ) {
        return Err(ApiError::invalid_field(
            "status",
            "Status must be 'completed' or 'no_show'",
        ));
    }

    find_organized_session(&state, &auth, id).await?;

    let participant = Participant::find_by_id(&state.db, participant_id)
        .await?
        .filter(|p| p.session_id == id)
        .ok_or_else(|| ApiError::NotFound("Participant not found".to_string()))?;

    participant.status.ensure_transition(req.status)?;

    let updated = Participant::transition(&state.db, participant_id, participant.status, req.status)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Participant status changed concurrently".to_string())
        })?;

    Ok(Json(updated))
}
