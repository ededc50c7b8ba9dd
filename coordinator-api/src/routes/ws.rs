/// Real-time WebSocket endpoint
///
/// # Endpoint
///
/// `GET /v1/ws?token=<access token>` (or `Authorization: Bearer <token>`)
///
/// Browsers cannot set headers on a WebSocket handshake, so the access token
/// may travel in the query string instead.
///
/// # Frames
///
/// Server to client: every [`ServerEvent`] published to the caller's room,
/// serialized as JSON text.
///
/// Client to server:
///
/// ```json
/// {"type": "private_message", "to": "<user id>", "content": "Running 10 min late"}
/// {"type": "typing", "to": "<user id>"}
/// {"type": "ping"}
/// ```
///
/// The sender of a private message is always the authenticated user. A frame
/// that cannot be handled produces an `error` event; the connection stays open.

use crate::{app::AppState, error::ApiError, routes::messages::deliver_message};
use axum::{
    extract::{
        ws::{
            rejection::WebSocketUpgradeRejection, Message as WsMessage, WebSocket,
            WebSocketUpgrade,
        },
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use coordinator_shared::{
    auth::middleware::{authenticate_token, extract_bearer_token},
    models::message::CreateMessage,
    realtime::{ClientEvent, ServerEvent},
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Authenticates the handshake, then upgrades
///
/// # Errors
///
/// - `401 Unauthorized`: No token, or the token is not a valid access token
/// - `400 Bad Request`: Not a WebSocket handshake
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let token = match query.token.as_deref() {
        Some(token) => token,
        None => extract_bearer_token(&headers)?,
    };
    let auth = authenticate_token(token, state.jwt_secret())?;

    let upgrade = upgrade.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let user_id = auth.user_id;

    Ok(upgrade.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sink, mut frames) = socket.split();
    let mut events = BroadcastStream::new(state.hub.subscribe(user_id).await);

    info!(user_id = %user_id, "WebSocket connected");

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    warn!(user_id = %user_id, skipped, "WebSocket client lagged, events dropped");
                }
                None => break,
            },
            frame = frames.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(reply) = handle_client_frame(&state, user_id, &text).await {
                        if send_event(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    let reply = ServerEvent::error("Binary frames are not supported");
                    if send_event(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(user_id = %user_id, error = %e, "WebSocket receive failed");
                    break;
                }
            },
        }
    }

    drop(events);
    state.hub.release(user_id).await;

    info!(user_id = %user_id, "WebSocket disconnected");
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => sink.send(WsMessage::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize server event");
            Ok(())
        }
    }
}

/// Handles one text frame from `user_id`, returning a direct reply if any
///
/// Delivered messages reach the sender through their own room, so a
/// successful `private_message` has no direct reply.
pub async fn handle_client_frame(
    state: &AppState,
    user_id: Uuid,
    text: &str,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => return Some(ServerEvent::error(format!("Invalid frame: {e}"))),
    };

    match event {
        ClientEvent::PrivateMessage { to, content } => {
            let data = CreateMessage {
                recipient_id: to,
                content,
                project_id: None,
                session_id: None,
            };

            match deliver_message(state, user_id, data).await {
                Ok(_) => None,
                Err(err) => Some(ServerEvent::error(err.public_message())),
            }
        }
        ClientEvent::Typing { to } => {
            if to != user_id {
                state
                    .hub
                    .publish(to, ServerEvent::Typing { from: user_id })
                    .await;
            }
            None
        }
        ClientEvent::Ping => Some(ServerEvent::Pong),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RealtimeConfig};
    use coordinator_shared::db::pool::{self, DatabaseConfig as PoolConfig};

    fn test_state() -> AppState {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/unused".to_string(),
                max_connections: 1,
                run_migrations: false,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            realtime: RealtimeConfig {
                channel_capacity: 8,
            },
        };

        let db = pool::create_lazy_pool(&PoolConfig::from_url(config.database.url.clone()))
            .unwrap();
        AppState::new(db, config)
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let state = test_state();
        let reply = handle_client_frame(&state, Uuid::new_v4(), r#"{"type":"ping"}"#).await;
        assert_eq!(reply, Some(ServerEvent::Pong));
    }

    #[tokio::test]
    async fn test_malformed_frame_gets_error() {
        let state = test_state();

        for frame in ["not json", r#"{"type":"shout"}"#, r#"{"type":"typing"}"#] {
            let reply = handle_client_frame(&state, Uuid::new_v4(), frame).await;
            assert!(
                matches!(reply, Some(ServerEvent::Error { .. })),
                "frame {frame} should produce an error event"
            );
        }
    }

    #[tokio::test]
    async fn test_typing_reaches_recipient() {
        let state = test_state();
        let sender = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let mut rx = state.hub.subscribe(recipient).await;

        let frame = format!(r#"{{"type":"typing","to":"{recipient}"}}"#);
        let reply = handle_client_frame(&state, sender, &frame).await;

        assert_eq!(reply, None);
        assert_eq!(rx.recv().await.unwrap(), ServerEvent::Typing { from: sender });
    }

    #[tokio::test]
    async fn test_message_to_self_rejected() {
        let state = test_state();
        let user = Uuid::new_v4();

        let frame = format!(r#"{{"type":"private_message","to":"{user}","content":"hi"}}"#);
        let reply = handle_client_frame(&state, user, &frame).await;

        assert_eq!(
            reply,
            Some(ServerEvent::error("You cannot message yourself"))
        );
    }
}
