use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{debug, instrument};

use crate::engine;
use crate::error::{Result, StoreError};
use crate::types::{Event, EventStatus, Mutation, NewEvent};

/// Authoritative in-memory set of event records.
///
/// Every mutation runs under the write lock, so one `apply`'s
/// validate-then-commit step is atomic with respect to every other `apply`.
/// Reads clone a snapshot under the read lock and never observe a partial
/// write. The store itself never publishes: a committed `apply` returns the
/// snapshot, and the caller is responsible for handing it to the broadcast
/// dispatcher after the lock is released.
pub struct EventStore {
    events: RwLock<BTreeMap<u64, Event>>,
    next_id: AtomicU64,
}

/// Result of a successful `apply`.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Post-mutation snapshot of the record.
    pub event: Event,
    /// Whether the store changed. `false` marks an idempotent no-op, which
    /// owes no broadcast.
    pub committed: bool,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Validate a draft and insert it under a freshly assigned id.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create(&self, draft: NewEvent) -> Result<Event> {
        engine::validate_schedule(draft.scheduled_at)?;
        if draft.duration == 0 {
            return Err(StoreError::Validation(
                "duration must be positive".to_string(),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            title: draft.title,
            organizer: draft.organizer,
            scheduled_at: draft.scheduled_at,
            duration: draft.duration,
            location: draft.location,
            participants: Vec::new(),
            status: EventStatus::Active,
        };

        self.events.write().unwrap().insert(id, event.clone());
        debug!(id, "event created");
        Ok(event)
    }

    /// Snapshot of every record, ordered by id.
    pub fn get_all(&self) -> Vec<Event> {
        self.events.read().unwrap().values().cloned().collect()
    }

    /// Snapshot of one record.
    pub fn get(&self, id: u64) -> Result<Event> {
        self.events
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    /// Validate and commit one mutation under the exclusive region.
    ///
    /// The lock covers exactly the validate+commit step; it is released
    /// before the caller hands the returned snapshot to the dispatcher, so
    /// a slow observer can never stall other mutations.
    #[instrument(skip(self, mutation))]
    pub fn apply(&self, id: u64, mutation: &Mutation) -> Result<ApplyOutcome> {
        let mut events = self.events.write().unwrap();
        let event = events.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        let committed = engine::apply(event, mutation)?;
        Ok(ApplyOutcome {
            event: event.clone(),
            committed,
        })
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
