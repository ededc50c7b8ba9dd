/// API route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: registration, login, token refresh, password change
/// - `users`: profiles and the musician directory
/// - `catalog`: instruments and genres
/// - `availability`: availability slots
/// - `projects`: projects, genres and instrument needs
/// - `invitations`: project invitations
/// - `sessions`: recording sessions and participants
/// - `payments`: payment records
/// - `messages`: direct messages
/// - `reviews`: user reviews
/// - `stats`: dashboard statistics
/// - `ws`: real-time WebSocket

pub mod auth;
pub mod availability;
pub mod catalog;
pub mod health;
pub mod invitations;
pub mod messages;
pub mod payments;
pub mod projects;
pub mod reviews;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod ws;
