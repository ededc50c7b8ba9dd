/// User reviews
///
/// One review per (reviewer, reviewee, project), where a missing project
/// counts as its own slot. Self-reviews are rejected by a check constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

const REVIEW_COLUMNS: &str =
    "id, reviewer_id, reviewee_id, project_id, rating, content, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub project_id: Option<Uuid>,
    pub rating: i16,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review joined with the reviewer's name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReceivedReview {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
    pub project_id: Option<Uuid>,
    pub rating: i16,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub reviewee_id: Uuid,
    pub project_id: Option<Uuid>,
    pub rating: i16,
    pub content: Option<String>,
}

/// Average and count of a user's ratings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingSummary {
    /// `None` when the user has no reviews
    pub average: Option<f64>,
    pub count: i64,
}

pub fn rating_in_range(rating: i16) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

impl Review {
    /// Creates a review
    ///
    /// # Errors
    ///
    /// A unique violation (`reviews_unique`) for a second review of the same
    /// user and project.
    pub async fn create(
        pool: &PgPool,
        reviewer_id: Uuid,
        data: CreateReview,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO reviews (reviewer_id, reviewee_id, project_id, rating, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Review>(&query)
            .bind(reviewer_id)
            .bind(data.reviewee_id)
            .bind(data.project_id)
            .bind(data.rating)
            .bind(data.content)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");

        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_reviewee(
        pool: &PgPool,
        reviewee_id: Uuid,
    ) -> Result<Vec<ReceivedReview>, sqlx::Error> {
        sqlx::query_as::<_, ReceivedReview>(
            r#"
            SELECT r.id, r.reviewer_id, u.first_name || ' ' || u.last_name AS reviewer_name,
                   r.project_id, r.rating, r.content, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.reviewee_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(reviewee_id)
        .fetch_all(pool)
        .await
    }

    pub async fn summary_for(pool: &PgPool, reviewee_id: Uuid) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(rating)::FLOAT8 AS average, COUNT(*) AS count
            FROM reviews
            WHERE reviewee_id = $1
            "#,
        )
        .bind(reviewee_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_in_range() {
        assert!(rating_in_range(1));
        assert!(rating_in_range(5));
        assert!(!rating_in_range(0));
        assert!(!rating_in_range(6));
        assert!(!rating_in_range(-1));
    }
}
