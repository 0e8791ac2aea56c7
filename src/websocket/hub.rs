use dashmap::DashMap;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

pub type WsSender = mpsc::UnboundedSender<String>;

/// Live in-app feed: every open socket of a user, keyed by user id.
#[derive(Clone)]
pub struct NotificationHub {
    connections: Arc<DashMap<String, Vec<(u64, WsSender)>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self, user_id: &str) -> (u64, mpsc::UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .entry(user_id.to_string())
            .or_default()
            .push((conn_id, tx));
        (conn_id, rx)
    }

    pub fn unsubscribe(&self, user_id: &str, conn_id: u64) {
        if let Some(mut senders) = self.connections.get_mut(user_id) {
            senders.retain(|(id, _)| *id != conn_id);
            let now_empty = senders.is_empty();
            drop(senders);
            if now_empty {
                self.connections.remove_if(user_id, |_, s| s.is_empty());
            }
        }
    }

    /// Returns how many sockets received the message.
    pub fn send_to_user(&self, user_id: &str, message: &str) -> usize {
        let Some(mut senders) = self.connections.get_mut(user_id) else {
            return 0;
        };
        // Closed channels are dropped while sending.
        senders.retain(|(_, sender)| sender.send(message.to_string()).is_ok());
        let delivered = senders.len();
        drop(senders);
        if delivered == 0 {
            self.connections.remove_if(user_id, |_, s| s.is_empty());
        }
        delivered
    }

    pub fn publish(&self, user_id: &str, kind: &str, data: Value) -> usize {
        let envelope = serde_json::json!({ "type": kind, "data": data });
        self.send_to_user(user_id, &envelope.to_string())
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.connections.contains_key(user_id)
    }
}
