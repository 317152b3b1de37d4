use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an event record.
///
/// The transition is one-directional: Active -> Cancelled. A cancelled
/// record accepts no further mutation but stays visible in reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Cancelled,
}

/// The shared record coordinated by the store and pushed to observers.
///
/// Broadcast payloads serialize this struct as-is, no envelope and no
/// sequence number. An observer that missed a push reconciles by reading
/// the listing again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique across the store, immutable, assigned at creation.
    pub id: u64,
    pub title: String,
    pub organizer: String,
    /// Never in the past for a record accepted by creation or update.
    pub scheduled_at: DateTime<Utc>,
    /// Length in hours.
    pub duration: u32,
    pub location: String,
    /// Identity strings in join order, no duplicates.
    pub participants: Vec<String>,
    pub status: EventStatus,
}

/// Creation draft. The store validates it and assigns the id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub organizer: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration: u32,
    pub location: String,
}

/// One atomic state change applied to a single record.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Full replacement of the four fields. Participants and status are
    /// untouched. Carries no authorization check.
    Update {
        title: String,
        organizer: String,
        scheduled_at: DateTime<Utc>,
        location: String,
    },
    /// Append `user` to the participants. Already present is a no-op.
    Join { user: String },
    /// Remove `user` from the participants. Absent is a no-op.
    Leave { user: String },
    /// Organizer-only transition to Cancelled.
    Cancel { user: String },
}
