/// Review endpoints
///
/// # Endpoints
///
/// - `POST /v1/reviews` - Review another user
/// - `DELETE /v1/reviews/:id` - Delete own review
/// - `GET /v1/users/:id/reviews` - Reviews a user received, with rating summary

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coordinator_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    models::{
        review::{rating_in_range, CreateReview, RatingSummary, ReceivedReview, Review},
        user::User,
    },
    realtime::{Notification, NotificationKind},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub reviewee_id: Uuid,
    pub project_id: Option<Uuid>,

    pub rating: i16,

    #[validate(length(max = 5000, message = "Review must be at most 5000 characters"))]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub summary: RatingSummary,
    pub reviews: Vec<ReceivedReview>,
}

/// Review another user
///
/// # Errors
///
/// - `404 Not Found`: Reviewee does not exist
/// - `409 Conflict`: Already reviewed this user for this project
/// - `422 Unprocessable Entity`: Rating out of range or self-review
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    if !rating_in_range(req.rating) {
        return Err(ApiError::invalid_field(
            "rating",
            "Rating must be between 1 and 5",
        ));
    }

    if req.reviewee_id == auth.user_id {
        return Err(ApiError::invalid_field(
            "reviewee_id",
            "You cannot review yourself",
        ));
    }

    if User::find_by_id(&state.db, req.reviewee_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let review = Review::create(
        &state.db,
        auth.user_id,
        CreateReview {
            reviewee_id: req.reviewee_id,
            project_id: req.project_id,
            rating: req.rating,
            content: req.content,
        },
    )
    .await?;

    tracing::info!(
        review_id = %review.id,
        reviewer_id = %auth.user_id,
        reviewee_id = %review.reviewee_id,
        rating = review.rating,
        "Review created"
    );

    state
        .notify(
            review.reviewee_id,
            Notification::new(
                NotificationKind::Review,
                review.id,
                format!("You received a {}-star review", review.rating),
            ),
        )
        .await;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let review = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    require_owner(&auth, review.reviewer_id)?;

    Review::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_reviews(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserReviewsResponse>> {
    let summary = Review::summary_for(&state.db, user_id).await?;
    let reviews = Review::list_for_reviewee(&state.db, user_id).await?;

    Ok(Json(UserReviewsResponse { summary, reviews }))
}
