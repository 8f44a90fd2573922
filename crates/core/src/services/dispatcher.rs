//! Real-time dispatcher.
//!
//! Fans notification events out to every live connection an account holds.
//! Delivery is at-most-once: nothing is persisted or replayed, and an
//! account with no open connection simply misses the push.

use async_trait::async_trait;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};

use crate::views::NotificationView;

/// Identifies one live connection inside a room.
pub type ConnectionId = u64;

/// Sending half handed to the dispatcher for one connection.
pub type ConnectionSender = mpsc::UnboundedSender<DispatchMessage>;

/// Server-to-client messages on the streaming connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum DispatchMessage {
    /// A freshly persisted notification.
    NewNotification(NotificationView),
    /// Current unread count of the recipient.
    NotificationCountUpdate { count: u64 },
    /// Echo of a read acknowledgement.
    NotificationRead { id: String },
    /// Failure of an action requested over this connection.
    Error { message: String },
    /// Reply to a client ping.
    Pong,
}

/// Trait for delivering messages to an account's live connections.
///
/// This lets the core services push events without depending on the
/// transport that holds the sockets.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Join a connection to the account's room.
    async fn register(&self, account_id: &str, sender: ConnectionSender) -> ConnectionId;

    /// Remove a connection from the account's room.
    async fn unregister(&self, account_id: &str, connection_id: ConnectionId);

    /// Send a message to every connection in the account's room.
    ///
    /// Returns the number of connections that accepted it.
    async fn broadcast(&self, account_id: &str, message: DispatchMessage) -> usize;
}

/// Type alias for a shared dispatcher.
pub type DispatcherService = Arc<dyn Dispatcher>;

/// A no-op dispatcher for testing or when real-time delivery is disabled.
#[derive(Clone, Default)]
pub struct NoOpDispatcher;

#[async_trait]
impl Dispatcher for NoOpDispatcher {
    async fn register(&self, _account_id: &str, _sender: ConnectionSender) -> ConnectionId {
        0
    }

    async fn unregister(&self, _account_id: &str, _connection_id: ConnectionId) {}

    async fn broadcast(&self, _account_id: &str, _message: DispatchMessage) -> usize {
        0
    }
}

/// In-memory room table: account id to the senders of its live connections.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, HashMap<ConnectionId, ConnectionSender>>>,
    next_id: AtomicU64,
}

impl RoomRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live connections for an account.
    pub async fn connection_count(&self, account_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(account_id)
            .map_or(0, HashMap::len)
    }

    /// Number of accounts with at least one live connection.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl Dispatcher for RoomRegistry {
    async fn register(&self, account_id: &str, sender: ConnectionSender) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.rooms
            .write()
            .await
            .entry(account_id.to_string())
            .or_default()
            .insert(id, sender);
        tracing::debug!(account_id = %account_id, connection_id = id, "Connection joined room");
        id
    }

    async fn unregister(&self, account_id: &str, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(account_id) {
            room.remove(&connection_id);
            if room.is_empty() {
                rooms.remove(account_id);
            }
        }
        tracing::debug!(account_id = %account_id, connection_id, "Connection left room");
    }

    async fn broadcast(&self, account_id: &str, message: DispatchMessage) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let rooms = self.rooms.read().await;
            let Some(room) = rooms.get(account_id) else {
                return 0;
            };

            for (id, sender) in room {
                if sender.send(message.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
        }

        // Receivers dropped without unregistering
        for id in closed {
            self.unregister(account_id, id).await;
        }

        delivered
    }
}
