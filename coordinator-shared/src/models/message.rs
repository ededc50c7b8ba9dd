/// Direct messages between users
///
/// Messages are stored once and shared by both parties. Only the recipient
/// can mark a message as read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Pagination;

/// Longest message body accepted
pub const MAX_MESSAGE_LENGTH: usize = 5000;

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, content, read, project_id, session_id, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub read: bool,
    pub project_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub recipient_id: Uuid,
    pub content: String,
    pub project_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
}

/// Latest exchange with one counterpart
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Conversation {
    pub user_id: Uuid,
    pub user_name: String,
    pub last_message_id: Uuid,
    pub last_message: String,
    pub last_sender_id: Uuid,
    pub last_message_at: DateTime<Utc>,

    /// Unread messages from this counterpart
    pub unread_count: i64,
}

impl Message {
    pub async fn create(
        pool: &PgPool,
        sender_id: Uuid,
        data: CreateMessage,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO messages (sender_id, recipient_id, content, project_id, session_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Message>(&query)
            .bind(sender_id)
            .bind(data.recipient_id)
            .bind(data.content)
            .bind(data.project_id)
            .bind(data.session_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1");

        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Messages exchanged by two users, oldest first
    ///
    /// Pagination counts back from the newest message.
    pub async fn thread(
        pool: &PgPool,
        user_id: Uuid,
        other_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM (
                SELECT {MESSAGE_COLUMNS}
                FROM messages
                WHERE (sender_id = $1 AND recipient_id = $2)
                   OR (sender_id = $2 AND recipient_id = $1)
                ORDER BY created_at DESC
                LIMIT $3 OFFSET $4
            ) recent
            ORDER BY created_at
            "#
        );

        sqlx::query_as::<_, Message>(&query)
            .bind(user_id)
            .bind(other_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// One entry per counterpart, most recent conversation first
    pub async fn conversations(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(
            r#"
            WITH latest AS (
                SELECT DISTINCT ON (other_id)
                       other_id, id, content, sender_id, created_at
                FROM (
                    SELECT m.*,
                           CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END
                               AS other_id
                    FROM messages m
                    WHERE m.sender_id = $1 OR m.recipient_id = $1
                ) mine
                ORDER BY other_id, created_at DESC
            )
            SELECT l.other_id AS user_id,
                   u.first_name || ' ' || u.last_name AS user_name,
                   l.id AS last_message_id,
                   l.content AS last_message,
                   l.sender_id AS last_sender_id,
                   l.created_at AS last_message_at,
                   (SELECT COUNT(*) FROM messages um
                    WHERE um.sender_id = l.other_id AND um.recipient_id = $1 AND NOT um.read)
                       AS unread_count
            FROM latest l
            JOIN users u ON u.id = l.other_id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND NOT read")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count.0)
    }

    /// Marks a message read if `recipient_id` received it
    ///
    /// Returns `None` when the message does not exist or belongs to someone else.
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE messages
            SET read = TRUE, updated_at = NOW()
            WHERE id = $1 AND recipient_id = $2
            RETURNING {MESSAGE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .bind(recipient_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks everything `sender_id` sent to `recipient_id` as read
    pub async fn mark_thread_read(
        pool: &PgPool,
        recipient_id: Uuid,
        sender_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read = TRUE, updated_at = NOW()
            WHERE recipient_id = $1 AND sender_id = $2 AND NOT read
            "#,
        )
        .bind(recipient_id)
        .bind(sender_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Trims a message body and checks its length
pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        None
    } else {
        Some(trimmed.to_string())
    }
}
