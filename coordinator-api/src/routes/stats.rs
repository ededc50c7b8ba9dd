/// Dashboard statistics
///
/// ```text
/// GET /v1/stats
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use coordinator_shared::{auth::middleware::AuthContext, models::stats::DashboardStats};

pub async fn dashboard_stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(DashboardStats::for_user(&state.db, auth.user_id).await?))
}
