//! Broadcast dispatch: push a committed snapshot to every live subscriber.

use std::sync::Arc;
use std::time::Duration;

use convene_core::config::DELIVERY_TIMEOUT_MS;
use convene_store::Event;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::ws::registry::SubscriberRegistry;

/// Fans committed snapshots out to the registry's current membership.
///
/// Delivery is best-effort and isolated per subscriber: a send that fails
/// or outlives the timeout drops that subscriber and delivery moves on to
/// the rest. Nothing here surfaces to the mutation caller, and the caller
/// is expected to run `publish` outside any store lock.
#[derive(Clone)]
pub struct EventPublisher {
    subscribers: Arc<SubscriberRegistry>,
}

impl EventPublisher {
    pub fn new(subscribers: Arc<SubscriberRegistry>) -> Self {
        Self { subscribers }
    }

    /// Deliver the full record snapshot to every registered subscriber.
    ///
    /// The payload is the bare record JSON, serialized once and shared by
    /// all deliveries. Returns the number of successful handoffs.
    pub async fn publish(&self, event: &Event) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                warn!(id = event.id, error = %e, "snapshot serialization failed, nothing broadcast");
                return 0;
            }
        };

        let deadline = Duration::from_millis(DELIVERY_TIMEOUT_MS);
        let mut delivered = 0;
        for (id, tx) in self.subscribers.snapshot() {
            match timeout(deadline, tx.send(payload.clone())).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(_)) => {
                    debug!(subscriber = %id, "subscriber gone, removing");
                    self.subscribers.unregister(&id);
                }
                Err(_) => {
                    warn!(subscriber = %id, "delivery timed out, removing subscriber");
                    self.subscribers.unregister(&id);
                }
            }
        }

        debug!(id = event.id, delivered, "snapshot broadcast");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use convene_store::EventStatus;
    use tokio::sync::mpsc;

    fn sample_event() -> Event {
        Event {
            id: 1,
            title: "Event 1".to_string(),
            organizer: "User A".to_string(),
            scheduled_at: Utc::now() + ChronoDuration::days(7),
            duration: 2,
            location: "Venue A".to_string(),
            participants: vec!["X".to_string()],
            status: EventStatus::Active,
        }
    }

    #[tokio::test]
    async fn every_live_subscriber_receives_the_snapshot() {
        let registry = Arc::new(SubscriberRegistry::new());
        let publisher = EventPublisher::new(Arc::clone(&registry));

        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.register(tx_a);
        registry.register(tx_b);

        let event = sample_event();
        assert_eq!(publisher.publish(&event).await, 2);

        for rx in [&mut rx_a, &mut rx_b] {
            let payload = rx.recv().await.unwrap();
            let parsed: Event = serde_json::from_str(&payload).unwrap();
            assert_eq!(parsed, event);
        }
    }

    #[tokio::test]
    async fn dead_subscriber_is_removed_without_disturbing_the_rest() {
        let registry = Arc::new(SubscriberRegistry::new());
        let publisher = EventPublisher::new(Arc::clone(&registry));

        let (tx_dead, rx_dead) = mpsc::channel(4);
        let (tx_live, mut rx_live) = mpsc::channel(4);
        registry.register(tx_dead);
        registry.register(tx_live);
        drop(rx_dead);

        assert_eq!(publisher.publish(&sample_event()).await, 1);

        // the failed handle is gone, the live one received the payload
        assert_eq!(registry.len(), 1);
        assert!(rx_live.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn wedged_subscriber_is_dropped_after_the_timeout() {
        let registry = Arc::new(SubscriberRegistry::new());
        let publisher = EventPublisher::new(Arc::clone(&registry));

        // capacity 1 with the slot already taken and nobody draining:
        // the delivery cannot complete and must time out
        let (tx, _rx) = mpsc::channel(1);
        tx.send("stale".to_string()).await.unwrap();
        registry.register(tx);

        assert_eq!(publisher.publish(&sample_event()).await, 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_noop() {
        let registry = Arc::new(SubscriberRegistry::new());
        let publisher = EventPublisher::new(registry);
        assert_eq!(publisher.publish(&sample_event()).await, 0);
    }
}
