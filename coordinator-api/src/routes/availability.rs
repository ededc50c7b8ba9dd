/// Availability endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/:id/availability?from=2025-06-01&to=2025-06-30` - Slots with concrete dates
/// - `POST /v1/users/:id/availability` - Add a slot (self)
/// - `DELETE /v1/users/:id/availability/:slot_id` - Remove a slot (self)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use coordinator_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    models::availability::{Availability, CreateAvailability},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days shown when the query names no end date
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Longest range a single query may expand
const MAX_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A slot and the dates it applies to within the requested range
#[derive(Debug, Serialize)]
pub struct AvailabilityWindow {
    #[serde(flatten)]
    pub slot: Availability,

    pub occurrences: Vec<NaiveDate>,
}

/// Resolves the query range, defaulting to the next 30 days
fn resolve_range(query: &AvailabilityQuery, today: NaiveDate) -> ApiResult<(NaiveDate, NaiveDate)> {
    let from = query.from.unwrap_or(today);
    let to = match query.to {
        Some(to) => to,
        None => from
            .checked_add_signed(Duration::days(DEFAULT_WINDOW_DAYS))
            .ok_or_else(|| ApiError::BadRequest("'from' is out of range".to_string()))?,
    };

    if to < from {
        return Err(ApiError::BadRequest("'to' must not precede 'from'".to_string()));
    }
    if (to - from).num_days() > MAX_WINDOW_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Range cannot exceed {MAX_WINDOW_DAYS} days"
        )));
    }

    Ok((from, to))
}

pub async fn list_availability(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(user_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<Vec<AvailabilityWindow>>> {
    let (from, to) = resolve_range(&query, Utc::now().date_naive())?;

    let windows = Availability::list_for_user(&state.db, user_id, from, to)
        .await?
        .into_iter()
        .filter_map(|slot| {
            let occurrences = slot.occurrences_between(from, to);
            (!occurrences.is_empty()).then_some(AvailabilityWindow { slot, occurrences })
        })
        .collect();

    Ok(Json(windows))
}

/// Add an availability slot
///
/// ```text
/// POST /v1/users/:id/availability
///
/// {
///   "date": "2025-06-02",
///   "start_time": "10:00:00",
///   "end_time": "14:00:00",
///   "recurring": true,
///   "recurrence_pattern": "weekly",
///   "recurrence_end_date": "2025-08-25"
/// }
/// ```
pub async fn create_availability(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateAvailability>,
) -> ApiResult<(StatusCode, Json<Availability>)> {
    require_owner(&auth, user_id)?;
    req.check()
        .map_err(|message| ApiError::invalid_field("availability", message))?;

    let slot = Availability::create(&state.db, user_id, req).await?;
    tracing::debug!(slot_id = %slot.id, user_id = %user_id, "Availability added");

    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn delete_availability(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((user_id, slot_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_owner(&auth, user_id)?;

    if !Availability::delete(&state.db, slot_id, user_id).await? {
        return Err(ApiError::NotFound("Availability slot not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range() {
        let today = date(2025, 6, 1);
        let (from, to) = resolve_range(&AvailabilityQuery::default(), today).unwrap();
        assert_eq!(from, today);
        assert_eq!(to, date(2025, 7, 1));
    }

    #[test]
    fn test_range_rejections() {
        let today = date(2025, 6, 1);

        let reversed = AvailabilityQuery {
            from: Some(date(2025, 6, 10)),
            to: Some(date(2025, 6, 9)),
        };
        assert!(resolve_range(&reversed, today).is_err());

        let too_long = AvailabilityQuery {
            from: Some(date(2025, 1, 1)),
            to: Some(date(2026, 6, 1)),
        };
        assert!(resolve_range(&too_long, today).is_err());
    }

    #[test]
    fn test_default_range_past_last_date() {
        let query = AvailabilityQuery {
            from: Some(NaiveDate::MAX),
            to: None,
        };

        assert!(matches!(
            resolve_range(&query, date(2025, 6, 1)),
            Err(ApiError::BadRequest(_))
        ));
    }
}
