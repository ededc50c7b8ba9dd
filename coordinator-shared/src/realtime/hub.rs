/// Per-user rooms over `tokio::sync::broadcast`
///
/// Each online user has one broadcast channel; every live connection of that
/// user holds a receiver. Publishing to an offline user is a no-op that
/// returns 0. A receiver that falls more than `capacity` events behind skips
/// the missed events.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::events::ServerEvent;

/// Default number of buffered events per room
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct RealtimeHub {
    rooms: Arc<RwLock<HashMap<Uuid, broadcast::Sender<ServerEvent>>>>,
    capacity: usize,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!("Realtime hub initialized with room capacity {}", capacity);

        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Joins the user's room, creating it on first connection
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        let rx = sender.subscribe();
        debug!(
            user_id = %user_id,
            connections = sender.receiver_count(),
            "Connection joined room"
        );
        rx
    }

    /// Sends an event to every connection of `user_id`
    ///
    /// Returns the number of connections reached.
    pub async fn publish(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let rooms = self.rooms.read().await;

        match rooms.get(&user_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Sends the same event to several users, returning total connections reached
    pub async fn publish_many<I>(&self, user_ids: I, event: ServerEvent) -> usize
    where
        I: IntoIterator<Item = Uuid>,
    {
        let rooms = self.rooms.read().await;

        user_ids
            .into_iter()
            .filter_map(|user_id| rooms.get(&user_id))
            .map(|sender| sender.send(event.clone()).unwrap_or(0))
            .sum()
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// Drops the user's room once no connection holds a receiver
    ///
    /// Call after the connection's receiver has been dropped.
    pub async fn release(&self, user_id: Uuid) {
        let mut rooms = self.rooms.write().await;

        if rooms
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            rooms.remove(&user_id);
            debug!(user_id = %user_id, "Room closed");
        }
    }

    /// Number of open rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
