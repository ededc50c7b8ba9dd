/// Database models
///
/// Each model owns its SQL and exposes async associated functions taking a
/// `&PgPool`. Lookups return `Option`; status changes are compare-and-set
/// updates that return `None` when the row is no longer in the expected state.
///
/// # Models
///
/// - `user`: accounts (musicians, producers, studios)
/// - `musician_profile`: musician details, instruments and genres
/// - `catalog`: instrument and genre catalog
/// - `project`: projects with genres and instrument needs
/// - `invitation`: project invitations
/// - `session`: recording sessions
/// - `participant`: musicians attached to a session
/// - `payment`: payment records
/// - `message`: direct messages and conversations
/// - `review`: user reviews
/// - `availability`: availability slots
/// - `stats`: dashboard aggregates
///
/// # Example
///
/// ```no_run
/// use coordinator_shared::db::pool::{create_pool, DatabaseConfig};
/// use coordinator_shared::models::user::{CreateUser, User, UserType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/coordinator")).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "drummer@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     user_type: UserType::Musician,
///     first_name: "Ana".to_string(),
///     last_name: "Reyes".to_string(),
///     bio: None,
///     location: Some("Lisbon".to_string()),
///     hourly_rate_cents: Some(4500),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use serde::Deserialize;

pub mod availability;
pub mod catalog;
pub mod invitation;
pub mod message;
pub mod musician_profile;
pub mod participant;
pub mod payment;
pub mod project;
pub mod review;
pub mod session;
pub mod stats;
pub mod status;
pub mod user;

pub use status::{StatusLifecycle, TransitionError};

/// Largest page size any list endpoint returns
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Limit/offset pagination, usually deserialized from the query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Limit clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset, never negative
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
