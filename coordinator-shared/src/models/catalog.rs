/// Instrument and genre catalog
///
/// Names are unique; a duplicate insert surfaces as a unique violation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Instrument {
    pub id: Uuid,
    pub name: String,

    /// Grouping such as "strings" or "percussion"
    pub category: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instrument {
    pub async fn create(pool: &PgPool, name: &str, category: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Instrument>(
            r#"
            INSERT INTO instruments (name, category)
            VALUES ($1, $2)
            RETURNING id, name, category, created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .bind(category.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>(
            "SELECT id, name, category, created_at, updated_at FROM instruments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All instruments ordered by category, then name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Instrument>(
            r#"
            SELECT id, name, category, created_at, updated_at
            FROM instruments
            ORDER BY category, name
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

impl Genre {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            r#"
            INSERT INTO genres (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name, created_at, updated_at FROM genres ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
