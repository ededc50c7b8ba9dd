/// Real-time delivery to connected users
///
/// # Example
///
/// ```no_run
/// use coordinator_shared::realtime::{Notification, NotificationKind, RealtimeHub};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let hub = RealtimeHub::new(64);
/// let user_id = Uuid::new_v4();
///
/// let mut rx = hub.subscribe(user_id).await;
/// hub.publish(
///     user_id,
///     Notification::new(NotificationKind::Payment, Uuid::new_v4(), "Payment received").into(),
/// )
/// .await;
/// let event = rx.recv().await;
/// # }
/// ```

pub mod events;
pub mod hub;

pub use events::{ClientEvent, Notification, NotificationKind, ServerEvent};
pub use hub::{RealtimeHub, DEFAULT_CHANNEL_CAPACITY};
