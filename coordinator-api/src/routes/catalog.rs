/// Instrument and genre catalog
///
/// Any authenticated user can read the catalog; producers and studios add to it.

use crate::{app::AppState, error::ApiResult, extract::ValidatedJson};
use axum::{extract::State, http::StatusCode, Json};
use coordinator_shared::{
    auth::{
        authorization::{require_user_type, ORGANIZER_TYPES},
        middleware::AuthContext,
    },
    models::catalog::{Genre, Instrument},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInstrumentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

pub async fn list_instruments(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<Instrument>>> {
    Ok(Json(Instrument::list(&state.db).await?))
}

/// 409 if the name is taken
pub async fn create_instrument(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateInstrumentRequest>,
) -> ApiResult<(StatusCode, Json<Instrument>)> {
    require_user_type(&auth, ORGANIZER_TYPES)?;

    let instrument = Instrument::create(&state.db, &req.name, &req.category).await?;
    tracing::info!(instrument_id = %instrument.id, name = %instrument.name, "Instrument added");

    Ok((StatusCode::CREATED, Json(instrument)))
}

pub async fn list_genres(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(Genre::list(&state.db).await?))
}

/// 409 if the name is taken
pub async fn create_genre(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateGenreRequest>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    require_user_type(&auth, ORGANIZER_TYPES)?;

    let genre = Genre::create(&state.db, &req.name).await?;
    tracing::info!(genre_id = %genre.id, name = %genre.name, "Genre added");

    Ok((StatusCode::CREATED, Json(genre)))
}
