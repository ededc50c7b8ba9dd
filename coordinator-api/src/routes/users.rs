/// User profile and musician directory endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/musicians` - Search musicians by instrument, genre, location
/// - `GET /v1/users/:id` - Public profile
/// - `PUT /v1/users/:id` - Update own profile
/// - `PUT /v1/users/:id/musician-profile` - Update own musician details
/// - `PUT /v1/users/:id/instruments` - Replace instruments played
/// - `PUT /v1/users/:id/genres` - Replace genres played

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use coordinator_shared::{
    auth::{
        authorization::{require_owner, require_user_type},
        middleware::AuthContext,
    },
    models::{
        catalog::Genre,
        musician_profile::{
            InstrumentSkill, MusicianProfile, PlayedInstrument, UpdateMusicianProfile,
        },
        review::{RatingSummary, Review},
        user::{MusicianFilter, UpdateUser, User, UserType},
        Pagination,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User with everything a profile page shows
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: User,

    pub musician_profile: Option<MusicianProfile>,
    pub instruments: Vec<PlayedInstrument>,
    pub genres: Vec<Genre>,
    pub rating: RatingSummary,

    /// Holds at least one live WebSocket connection
    pub online: bool,
}

/// Gathers profile details for a user
pub async fn load_profile(state: &AppState, user: User) -> ApiResult<UserProfileResponse> {
    let (musician_profile, instruments, genres) = if user.user_type == UserType::Musician {
        match MusicianProfile::find_by_user_id(&state.db, user.id).await? {
            Some(profile) => {
                let instruments = MusicianProfile::instruments(&state.db, profile.id).await?;
                let genres = MusicianProfile::genres(&state.db, profile.id).await?;
                (Some(profile), instruments, genres)
            }
            None => (None, Vec::new(), Vec::new()),
        }
    } else {
        (None, Vec::new(), Vec::new())
    };

    let rating = Review::summary_for(&state.db, user.id).await?;
    let online = state.hub.is_online(user.id).await;

    Ok(UserProfileResponse {
        user,
        musician_profile,
        instruments,
        genres,
        rating,
        online,
    })
}

/// Query string for the musician directory
#[derive(Debug, Default, Deserialize)]
pub struct MusicianQuery {
    pub instrument_id: Option<Uuid>,
    pub genre_id: Option<Uuid>,
    pub location: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(range(min = 0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate_cents: Option<i64>,

    #[validate(url(message = "Invalid image URL"))]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMusicianProfileRequest {
    #[validate(range(min = 0, max = 80, message = "Years of experience must be 0-80"))]
    pub years_experience: Option<i32>,

    pub studio_experience: Option<bool>,
    pub remote_recording_capability: Option<bool>,

    #[validate(url(message = "Invalid portfolio URL"))]
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetInstrumentsRequest {
    #[validate(length(max = 50, message = "At most 50 instruments"))]
    pub instruments: Vec<InstrumentSkill>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetGenresRequest {
    #[validate(length(max = 50, message = "At most 50 genres"))]
    pub genre_ids: Vec<Uuid>,
}

async fn own_musician_profile(
    state: &AppState,
    auth: &AuthContext,
    user_id: Uuid,
) -> ApiResult<MusicianProfile> {
    require_owner(auth, user_id)?;
    require_user_type(auth, &[UserType::Musician])?;

    MusicianProfile::find_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Musician profile not found".to_string()))
}

/// Search musicians
///
/// ```text
/// GET /v1/users/musicians?instrument_id=<uuid>&genre_id=<uuid>&location=berlin&limit=20
/// ```
pub async fn list_musicians(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(query): Query<MusicianQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let filter = MusicianFilter {
        instrument_id: query.instrument_id,
        genre_id: query.genre_id,
        location: query
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
    };
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let musicians = User::list_musicians(&state.db, &filter, page).await?;
    Ok(Json(musicians))
}

/// Public profile of any user
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfileResponse>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(load_profile(&state, user).await?))
}

/// Update own profile fields
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    require_owner(&auth, id)?;

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            location: req.location,
            hourly_rate_cents: req.hourly_rate_cents,
            profile_image_url: req.profile_image_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Update own musician details, creating the profile if missing
pub async fn update_musician_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateMusicianProfileRequest>,
) -> ApiResult<Json<MusicianProfile>> {
    require_owner(&auth, id)?;
    require_user_type(&auth, &[UserType::Musician])?;

    let profile = MusicianProfile::upsert(
        &state.db,
        id,
        UpdateMusicianProfile {
            years_experience: req.years_experience,
            studio_experience: req.studio_experience,
            remote_recording_capability: req.remote_recording_capability,
            portfolio_url: req.portfolio_url,
        },
    )
    .await?;

    Ok(Json(profile))
}

/// Replace the instruments a musician plays
pub async fn set_instruments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetInstrumentsRequest>,
) -> ApiResult<Json<Vec<PlayedInstrument>>> {
    if let Some(bad) = req.instruments.iter().find(|skill| !skill.is_valid()) {
        return Err(ApiError::invalid_field(
            "instruments",
            format!(
                "Proficiency level for instrument {} must be between 1 and 5",
                bad.instrument_id
            ),
        ));
    }

    let profile = own_musician_profile(&state, &auth, id).await?;

    MusicianProfile::set_instruments(&state.db, profile.id, &req.instruments).await?;
    let instruments = MusicianProfile::instruments(&state.db, profile.id).await?;

    Ok(Json(instruments))
}

/// Replace the genres a musician plays
pub async fn set_genres(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetGenresRequest>,
) -> ApiResult<Json<Vec<Genre>>> {
    let profile = own_musician_profile(&state, &auth, id).await?;

    MusicianProfile::set_genres(&state.db, profile.id, &req.genre_ids).await?;
    let genres = MusicianProfile::genres(&state.db, profile.id).await?;

    Ok(Json(genres))
}
