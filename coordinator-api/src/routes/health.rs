/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": {
///     "connected": true,
///     "schema": { "applied": 3, "embedded": 3, "version": 20250621000003 },
///     "pool": { "size": 2, "idle": 1, "in_use": 1 }
///   },
///   "realtime_rooms": 3
/// }
/// ```
///
/// An unreachable database or pending migrations report `degraded` with a 200
/// so load balancers can tell a live process from a dead one.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use coordinator_shared::db::{
    migrations::{schema_status, SchemaStatus},
    pool::{self, PoolStats},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,

    /// Users with an open real-time room
    pub realtime_rooms: usize,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,

    /// Absent when the database could not be queried
    pub schema: Option<SchemaStatus>,
    pub pool: PoolStats,
}

impl DatabaseHealth {
    fn is_healthy(&self) -> bool {
        self.connected && self.schema.as_ref().is_some_and(|s| s.pending() == 0)
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let schema = if connected {
        schema_status(&state.db)
            .await
            .map_err(|e| tracing::warn!(error = %e, "Schema status unavailable"))
            .ok()
    } else {
        None
    };

    let database = DatabaseHealth {
        connected,
        schema,
        pool: pool::pool_stats(&state.db),
    };

    if let Some(schema) = database.schema.as_ref().filter(|s| s.pending() > 0) {
        tracing::warn!(pending = schema.pending(), "Database schema is behind this build");
    }

    Ok(Json(HealthResponse {
        status: if database.is_healthy() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        realtime_rooms: state.hub.room_count().await,
    }))
}
