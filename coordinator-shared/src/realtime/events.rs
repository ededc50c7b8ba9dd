/// Real-time wire events
///
/// Both directions are JSON objects tagged by `type`:
///
/// ```json
/// {"type": "private_message", "to": "6f1c...", "content": "See you at 10"}
/// {"type": "notification", "kind": "session_status", "resource_id": "...", "title": "..."}
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::Message;

/// Event pushed to a user's connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A direct message the user sent or received
    Message { message: Message },

    /// The counterpart is typing
    Typing { from: Uuid },

    Notification(Notification),

    /// A frame from this connection could not be handled
    Error { message: String },

    Pong,
}

/// Event received from a client connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    PrivateMessage { to: Uuid, content: String },
    Typing { to: Uuid },
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ProjectInvitation,
    InvitationResponse,
    SessionInvitation,
    ParticipantResponse,
    SessionStatus,
    Payment,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,

    /// Id of the project, invitation, session, payment or review concerned
    pub resource_id: Uuid,

    /// Short human-readable summary
    pub title: String,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, resource_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            kind,
            resource_id,
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

impl From<Notification> for ServerEvent {
    fn from(notification: Notification) -> Self {
        ServerEvent::Notification(notification)
    }
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}
