/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use coordinator_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use coordinator_shared::{
    auth::middleware::{authenticate_token, extract_bearer_token},
    realtime::{Notification, RealtimeHub},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Per-user real-time rooms
    pub hub: RealtimeHub,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let hub = RealtimeHub::new(config.realtime.channel_capacity);

        Self {
            db,
            config: Arc::new(config),
            hub,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Pushes a notification to a user's live connections
    pub async fn notify(&self, user_id: Uuid, notification: Notification) {
        let delivered = self.hub.publish(user_id, notification.into()).await;
        tracing::debug!(user_id = %user_id, delivered, "Notification published");
    }

    /// Pushes a notification to several users
    pub async fn notify_many(&self, user_ids: Vec<Uuid>, notification: Notification) {
        let delivered = self.hub.publish_many(user_ids, notification.into()).await;
        tracing::debug!(delivered, "Notification published to several users");
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                                   public
/// /v1/auth/{register,login,refresh}         public
/// /v1/ws                                    token in query or header
/// /v1/...                                   JWT required
/// ```
///
/// # Middleware Stack
///
/// Applied outermost first: security headers, CORS, request tracing, then
/// JWT authentication on the protected routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/change-password", post(routes::auth::change_password));

    let user_routes = Router::new()
        .route("/musicians", get(routes::users::list_musicians))
        .route(
            "/:id",
            get(routes::users::get_user).put(routes::users::update_user),
        )
        .route(
            "/:id/musician-profile",
            put(routes::users::update_musician_profile),
        )
        .route("/:id/instruments", put(routes::users::set_instruments))
        .route("/:id/genres", put(routes::users::set_genres))
        .route(
            "/:id/availability",
            get(routes::availability::list_availability)
                .post(routes::availability::create_availability),
        )
        .route(
            "/:id/availability/:slot_id",
            delete(routes::availability::delete_availability),
        )
        .route("/:id/reviews", get(routes::reviews::list_user_reviews));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/status", post(routes::projects::update_project_status))
        .route("/:id/genres", put(routes::projects::set_project_genres))
        .route(
            "/:id/instruments",
            get(routes::projects::list_project_instruments)
                .post(routes::projects::add_project_instrument),
        )
        .route(
            "/:id/invitations",
            get(routes::invitations::list_project_invitations)
                .post(routes::invitations::create_invitation),
        );

    let invitation_routes = Router::new()
        .route("/", get(routes::invitations::list_my_invitations))
        .route("/:id/respond", post(routes::invitations::respond_to_invitation))
        .route("/:id/cancel", post(routes::invitations::cancel_invitation));

    let session_routes = Router::new()
        .route(
            "/",
            get(routes::sessions::list_sessions).post(routes::sessions::create_session),
        )
        .route("/upcoming", get(routes::sessions::upcoming_sessions))
        .route(
            "/:id",
            get(routes::sessions::get_session)
                .put(routes::sessions::update_session)
                .delete(routes::sessions::delete_session),
        )
        .route("/:id/status", post(routes::sessions::update_session_status))
        .route(
            "/:id/participants",
            get(routes::sessions::list_participants).post(routes::sessions::add_participant),
        )
        .route("/:id/respond", post(routes::sessions::respond_to_session))
        .route(
            "/:id/participants/:participant_id/status",
            post(routes::sessions::update_participant_status),
        );

    let payment_routes = Router::new()
        .route(
            "/",
            get(routes::payments::list_payments).post(routes::payments::create_payment),
        )
        .route("/recent", get(routes::payments::recent_payments))
        .route("/:id", get(routes::payments::get_payment))
        .route("/:id/status", post(routes::payments::update_payment_status));

    let message_routes = Router::new()
        .route("/", post(routes::messages::send_message))
        .route("/conversations", get(routes::messages::list_conversations))
        .route("/unread-count", get(routes::messages::unread_count))
        .route("/read-all/:user_id", post(routes::messages::mark_thread_read))
        .route("/:id", get(routes::messages::get_thread))
        .route("/:id/read", post(routes::messages::mark_read));

    let review_routes = Router::new()
        .route("/", post(routes::reviews::create_review))
        .route("/:id", delete(routes::reviews::delete_review));

    let catalog_routes = Router::new()
        .route(
            "/instruments",
            get(routes::catalog::list_instruments).post(routes::catalog::create_instrument),
        )
        .route(
            "/genres",
            get(routes::catalog::list_genres).post(routes::catalog::create_genre),
        );

    let protected_routes = Router::new()
        .nest("/auth", protected_auth_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/invitations", invitation_routes)
        .nest("/sessions", session_routes)
        .nest("/payments", payment_routes)
        .nest("/messages", message_routes)
        .nest("/reviews", review_routes)
        .route("/stats", get(routes::stats::dashboard_stats))
        .merge(catalog_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .route("/ws", get(routes::ws::ws_handler))
        .merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// JWT authentication layer
///
/// Validates the bearer access token and injects the `AuthContext` into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;
    let auth_context = authenticate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
