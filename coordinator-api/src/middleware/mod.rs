/// Middleware for the API server
///
/// JWT authentication lives in `coordinator_shared::auth::middleware` and is
/// wired up in `app::build_router`.

pub mod security;
