//! Outbound delivery map
//!
//! Tracks the writer channel of every live connection so routed events can
//! be delivered by connection id. Delivery is fire-and-forget, at most
//! once: a target that has disconnected between addressing and delivery is
//! dropped silently, since the disconnect broadcast informs the sender
//! independently.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;

use crate::registry::ConnId;
use crate::router::{Outbound, ServerEvent};

/// Sender half of a connection's writer channel
pub type EventSender = mpsc::UnboundedSender<Message>;

/// Connection id to writer channel map
#[derive(Default)]
pub struct PeerMap {
    senders: RwLock<HashMap<ConnId, EventSender>>,
}

impl PeerMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's writer channel
    pub async fn register(&self, conn: ConnId, sender: EventSender) {
        self.senders.write().await.insert(conn, sender);
    }

    /// Remove a connection; later sends to its id are dropped
    pub async fn unregister(&self, conn: ConnId) {
        self.senders.write().await.remove(&conn);
    }

    /// Serialize and send one event to one connection
    ///
    /// Returns `false` when the event was dropped (stale target id or a
    /// writer that already hung up). Never surfaces an error to callers.
    pub async fn send(&self, to: ConnId, event: &ServerEvent) -> bool {
        let senders = self.senders.read().await;

        let Some(sender) = senders.get(&to) else {
            tracing::debug!(to, "Target connection gone, dropping event");
            return false;
        };

        match serde_json::to_string(event) {
            Ok(json) => sender.send(Message::Text(json)).is_ok(),
            Err(e) => {
                tracing::error!(to, error = %e, "Failed to serialize outbound event");
                false
            }
        }
    }

    /// Deliver a routed batch in order
    pub async fn deliver(&self, batch: Vec<Outbound>) {
        for out in batch {
            self.send(out.to, &out.event).await;
        }
    }

    /// Number of live connections
    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}
