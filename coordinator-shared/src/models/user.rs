/// User model and database operations
///
/// Users are musicians, producers or studios. Musicians additionally own a
/// [`MusicianProfile`](super::musician_profile::MusicianProfile) created at
/// registration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,          -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     user_type user_type NOT NULL,
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     bio TEXT,
///     location VARCHAR(255),
///     hourly_rate_cents BIGINT,
///     profile_image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use super::Pagination;

const USER_COLUMNS: &str = "id, email, password_hash, user_type, first_name, last_name, bio, \
     location, hourly_rate_cents, profile_image_url, created_at, updated_at, last_login_at";

/// Account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Musician,
    Producer,
    Studio,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Musician => "musician",
            UserType::Producer => "producer",
            UserType::Studio => "studio",
        }
    }

    /// Producers and studios organize projects and sessions
    pub fn is_organizer(&self) -> bool {
        matches!(self, UserType::Producer | UserType::Studio)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
///
/// The password hash is loaded for login checks but never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Lowercased email address
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub user_type: UserType,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id hash, never the plaintext password
    pub password_hash: String,

    pub user_type: UserType,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub hourly_rate_cents: Option<i64>,
}

/// Profile fields a user may change; `None` keeps the stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub profile_image_url: Option<String>,
}

/// Filters for the musician directory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicianFilter {
    pub instrument_id: Option<Uuid>,
    pub genre_id: Option<Uuid>,

    /// Case-insensitive substring match on location
    pub location: Option<String>,
}

/// Normalizes an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Creates a user, and for musicians an empty musician profile, in one
    /// transaction
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`users_email_key`) when the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, user_type, first_name, last_name,
                               bio, location, hourly_rate_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.user_type)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.bio)
            .bind(data.location)
            .bind(data.hourly_rate_cents)
            .fetch_one(&mut *tx)
            .await?;

        if user.user_type == UserType::Musician {
            sqlx::query("INSERT INTO musician_profiles (user_id) VALUES ($1)")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Returns true if an account already uses this email
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
                .bind(normalize_email(email))
                .fetch_one(pool)
                .await?;

        Ok(exists.0)
    }

    /// Updates profile fields
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                bio = COALESCE($4, bio),
                location = COALESCE($5, location),
                hourly_rate_cents = COALESCE($6, hourly_rate_cents),
                profile_image_url = COALESCE($7, profile_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.bio)
            .bind(data.location)
            .bind(data.hourly_rate_cents)
            .bind(data.profile_image_url)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists musicians, newest first, narrowed by instrument, genre and location
    pub async fn list_musicians(
        pool: &PgPool,
        filter: &MusicianFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.user_type = 'musician'
              AND ($1::uuid IS NULL OR EXISTS (
                    SELECT 1
                    FROM musician_profiles mp
                    JOIN musician_instruments mi ON mi.musician_profile_id = mp.id
                    WHERE mp.user_id = u.id AND mi.instrument_id = $1))
              AND ($2::uuid IS NULL OR EXISTS (
                    SELECT 1
                    FROM musician_profiles mp
                    JOIN musician_genres mg ON mg.musician_profile_id = mp.id
                    WHERE mp.user_id = u.id AND mg.genre_id = $2))
              AND ($3::text IS NULL OR u.location ILIKE '%' || $3 || '%')
            ORDER BY u.created_at DESC
            LIMIT $4 OFFSET $5
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(filter.instrument_id)
            .bind(filter.genre_id)
            .bind(filter.location.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }
}
