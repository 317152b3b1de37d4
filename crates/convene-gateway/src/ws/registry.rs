//! Membership of live push connections.
//!
//! The registry decouples membership changes from in-flight delivery:
//! `register`/`unregister` mutate the map directly, while the dispatcher
//! iterates a `snapshot` copy and never holds a map entry across socket
//! I/O. Readers of membership never block writers and vice versa.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identity of one live push connection.
///
/// Never reused: a reconnecting client is a new subscriber and must
/// reconcile any missed state via the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Queue of serialized payloads drained by one connection task.
pub type SubscriberSender = mpsc::Sender<String>;

/// Live subscriber handles keyed by id.
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, SubscriberSender>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Add a handle and return its id. Safe to call while a dispatch is
    /// iterating an older snapshot.
    pub fn register(&self, tx: SubscriberSender) -> SubscriberId {
        let id = SubscriberId::new();
        self.subscribers.insert(id.clone(), tx);
        id
    }

    /// Remove a handle. Idempotent: the connection task and a failing
    /// dispatch may both call this for the same id.
    pub fn unregister(&self, id: &SubscriberId) {
        self.subscribers.remove(id);
    }

    /// Copy of the current membership for the dispatcher to iterate.
    pub fn snapshot(&self) -> Vec<(SubscriberId, SubscriberSender)> {
        self.subscribers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
