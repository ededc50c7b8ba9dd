/// Direct message endpoints
///
/// Messages sent here and over the WebSocket go through [`deliver_message`],
/// which stores the message and pushes it to both parties' live connections.
///
/// # Endpoints
///
/// - `POST /v1/messages` - Send a message
/// - `GET /v1/messages/conversations` - Latest message per counterpart
/// - `GET /v1/messages/unread-count` - Unread total
/// - `GET /v1/messages/:id` - Thread with user `:id`
/// - `POST /v1/messages/:id/read` - Mark message `:id` read (recipient)
/// - `POST /v1/messages/read-all/:user_id` - Mark everything from a user read

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coordinator_shared::{
    auth::middleware::AuthContext,
    models::{
        message::{normalize_content, Conversation, CreateMessage, Message, MAX_MESSAGE_LENGTH},
        user::User,
        Pagination,
    },
    realtime::ServerEvent,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub content: String,

    pub project_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Stores a message from `sender_id` and pushes it to both parties
///
/// # Errors
///
/// - `404 Not Found`: Recipient does not exist
/// - `422 Unprocessable Entity`: Empty or oversized body, or sending to oneself
pub async fn deliver_message(
    state: &AppState,
    sender_id: Uuid,
    data: CreateMessage,
) -> ApiResult<Message> {
    if data.recipient_id == sender_id {
        return Err(ApiError::invalid_field(
            "recipient_id",
            "You cannot message yourself",
        ));
    }

    let content = normalize_content(&data.content).ok_or_else(|| {
        ApiError::invalid_field(
            "content",
            format!("Message must be 1-{MAX_MESSAGE_LENGTH} characters"),
        )
    })?;

    if User::find_by_id(&state.db, data.recipient_id).await?.is_none() {
        return Err(ApiError::NotFound("Recipient not found".to_string()));
    }

    let message = Message::create(
        &state.db,
        sender_id,
        CreateMessage { content, ..data },
    )
    .await?;

    let event = ServerEvent::Message {
        message: message.clone(),
    };
    let delivered = state
        .hub
        .publish_many([message.recipient_id, message.sender_id], event)
        .await;

    tracing::debug!(
        message_id = %message.id,
        sender_id = %message.sender_id,
        recipient_id = %message.recipient_id,
        delivered,
        "Message sent"
    );

    Ok(message)
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = deliver_message(
        &state,
        auth.user_id,
        CreateMessage {
            recipient_id: req.recipient_id,
            content: req.content,
            project_id: req.project_id,
            session_id: req.session_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Conversation>>> {
    Ok(Json(Message::conversations(&state.db, auth.user_id).await?))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = Message::unread_count(&state.db, auth.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Thread with another user, oldest first
///
/// `limit` and `offset` count back from the newest message.
pub async fn get_thread(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(other_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Message>>> {
    let messages = Message::thread(&state.db, auth.user_id, other_id, page).await?;
    Ok(Json(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    let message = Message::mark_read(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

    Ok(Json(message))
}

pub async fn mark_thread_read(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = Message::mark_thread_read(&state.db, auth.user_id, user_id).await?;
    Ok(Json(MarkReadResponse { updated }))
}
