/// Project endpoints
///
/// # Endpoints
///
/// - `GET /v1/projects` - Projects the caller created or was invited to
/// - `POST /v1/projects` - Create a project (producer or studio)
/// - `GET /v1/projects/:id` - Project with genres and instrument needs
/// - `PUT /v1/projects/:id` - Update (creator)
/// - `DELETE /v1/projects/:id` - Delete (creator)
/// - `POST /v1/projects/:id/status` - Change status (creator)
/// - `PUT /v1/projects/:id/genres` - Replace genres (creator)
/// - `GET /v1/projects/:id/instruments` - Instrument needs
/// - `POST /v1/projects/:id/instruments` - Add an instrument need (creator)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ValidatedJson},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use coordinator_shared::{
    auth::{
        authorization::{require_owner, require_user_type, AuthzError, ORGANIZER_TYPES},
        middleware::AuthContext,
    },
    models::{
        catalog::Genre,
        project::{
            dates_in_order, CreateProject, Project, ProjectInstrument, ProjectStatus,
            UpdateProject,
        },
        Pagination, StatusLifecycle,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Description must be 1-10000 characters"))]
    pub description: String,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Budget cannot be negative"))]
    pub budget_cents: Option<i64>,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 genres"))]
    pub genre_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000, message = "Description must be 1-10000 characters"))]
    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Budget cannot be negative"))]
    pub budget_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest<S> {
    pub status: S,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetGenresRequest {
    #[validate(length(max = 20, message = "At most 20 genres"))]
    pub genre_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddInstrumentRequest {
    pub instrument_id: Uuid,

    #[validate(length(max = 2000, message = "Requirements must be at most 2000 characters"))]
    pub requirements: Option<String>,
}

/// Project with its genres and instrument needs
#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,

    pub genres: Vec<Genre>,
    pub instruments: Vec<ProjectInstrument>,
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    if dates_in_order(start, end) {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "end_date",
            "end_date must not precede start_date",
        ))
    }
}

pub(crate) async fn find_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Loads a project the caller created
pub(crate) async fn find_owned_project(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Project> {
    let project = find_project(state, id).await?;
    require_owner(auth, project.creator_id)?;
    Ok(project)
}

/// Loads a project the caller created or was invited to
async fn find_visible_project(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Project> {
    let project = find_project(state, id).await?;

    if project.creator_id != auth.user_id
        && !Project::is_member(&state.db, id, auth.user_id).await?
    {
        return Err(AuthzError::NotParticipant.into());
    }

    Ok(project)
}

pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let projects = Project::list_for_user(&state.db, auth.user_id, query.status, page).await?;
    Ok(Json(projects))
}

/// Create a project in `draft`
///
/// ```text
/// POST /v1/projects
///
/// {
///   "title": "Live at the Roundhouse",
///   "description": "Overdubs for the live album",
///   "start_date": "2025-07-01",
///   "end_date": "2025-07-20",
///   "budget_cents": 1500000
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is a musician
/// - `422 Unprocessable Entity`: Validation failed or dates out of order
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetails>)> {
    require_user_type(&auth, ORGANIZER_TYPES)?;
    check_dates(req.start_date, req.end_date)?;

    let project = Project::create(
        &state.db,
        auth.user_id,
        CreateProject {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            budget_cents: req.budget_cents,
        },
    )
    .await?;

    if !req.genre_ids.is_empty() {
        Project::set_genres(&state.db, project.id, &req.genre_ids).await?;
    }
    let genres = Project::genres(&state.db, project.id).await?;

    tracing::info!(project_id = %project.id, creator_id = %auth.user_id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectDetails {
            project,
            genres,
            instruments: Vec::new(),
        }),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetails>> {
    let project = find_visible_project(&state, &auth, id).await?;
    let genres = Project::genres(&state.db, id).await?;
    let instruments = Project::instruments(&state.db, id).await?;

    Ok(Json(ProjectDetails {
        project,
        genres,
        instruments,
    }))
}

pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let current = find_owned_project(&state, &auth, id).await?;

    if current.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Project is {} and can no longer be edited",
            current.status.as_str()
        )));
    }

    check_dates(
        req.start_date.or(current.start_date),
        req.end_date.or(current.end_date),
    )?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            budget_cents: req.budget_cents,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Delete a project with its sessions and invitations
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    find_owned_project(&state, &auth, id).await?;

    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Change project status
///
/// ```text
/// POST /v1/projects/:id/status
///
/// { "status": "open" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Transition not allowed, or the status changed meanwhile
pub async fn update_project_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest<ProjectStatus>>,
) -> ApiResult<Json<Project>> {
    let project = find_owned_project(&state, &auth, id).await?;
    project.status.ensure_transition(req.status)?;

    let updated = Project::transition(&state.db, id, project.status, req.status)
        .await?
        .ok_or_else(|| ApiError::Conflict("Project status changed concurrently".to_string()))?;

    tracing::info!(
        project_id = %id,
        from = project.status.as_str(),
        to = updated.status.as_str(),
        "Project status changed"
    );

    Ok(Json(updated))
}

pub async fn set_project_genres(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetGenresRequest>,
) -> ApiResult<Json<Vec<Genre>>> {
    find_owned_project(&state, &auth, id).await?;

    Project::set_genres(&state.db, id, &req.genre_ids).await?;
    Ok(Json(Project::genres(&state.db, id).await?))
}

pub async fn list_project_instruments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectInstrument>>> {
    find_visible_project(&state, &auth, id).await?;
    Ok(Json(Project::instruments(&state.db, id).await?))
}

/// Add or update an instrument need
pub async fn add_project_instrument(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddInstrumentRequest>,
) -> ApiResult<(StatusCode, Json<ProjectInstrument>)> {
    find_owned_project(&state, &auth, id).await?;

    let need = Project::add_instrument(&state.db, id, req.instrument_id, req.requirements).await?;
    Ok((StatusCode::CREATED, Json(need)))
}
