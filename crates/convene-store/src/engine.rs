//! Mutation application: validate one change against one record, then
//! commit it in place.
//!
//! The store calls into this module under its exclusive region; nothing
//! here touches shared state directly, which keeps the rules testable
//! without a store.

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::types::{Event, EventStatus, Mutation};

/// Apply `mutation` to `event`, returning whether the record changed.
///
/// `false` means the record was already in the requested state (join by an
/// existing participant, leave by a non-participant) and the caller owes no
/// broadcast for it. Validation runs before any field is written, so a
/// failed mutation leaves the record exactly as it was.
pub fn apply(event: &mut Event, mutation: &Mutation) -> Result<bool> {
    if event.status == EventStatus::Cancelled {
        return Err(StoreError::Validation(format!(
            "event {} is cancelled",
            event.id
        )));
    }

    match mutation {
        Mutation::Update {
            title,
            organizer,
            scheduled_at,
            location,
        } => {
            validate_schedule(*scheduled_at)?;
            event.title = title.clone();
            event.organizer = organizer.clone();
            event.scheduled_at = *scheduled_at;
            event.location = location.clone();
            Ok(true)
        }

        Mutation::Join { user } => {
            if event.participants.iter().any(|p| p == user) {
                return Ok(false);
            }
            event.participants.push(user.clone());
            Ok(true)
        }

        Mutation::Leave { user } => {
            let before = event.participants.len();
            event.participants.retain(|p| p != user);
            Ok(event.participants.len() != before)
        }

        Mutation::Cancel { user } => {
            if *user != event.organizer {
                return Err(StoreError::Unauthorized { id: event.id });
            }
            event.status = EventStatus::Cancelled;
            Ok(true)
        }
    }
}

/// Reject timestamps in the past. Creation runs the same check.
pub fn validate_schedule(scheduled_at: DateTime<Utc>) -> Result<()> {
    if scheduled_at < Utc::now() {
        return Err(StoreError::Validation(
            "scheduled_at must not be in the past".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active_event() -> Event {
        Event {
            id: 1,
            title: "Event 1".to_string(),
            organizer: "User A".to_string(),
            scheduled_at: Utc::now() + Duration::days(7),
            duration: 2,
            location: "Venue A".to_string(),
            participants: Vec::new(),
            status: EventStatus::Active,
        }
    }

    fn join(user: &str) -> Mutation {
        Mutation::Join {
            user: user.to_string(),
        }
    }

    #[test]
    fn join_appends_once() {
        let mut event = active_event();

        assert!(apply(&mut event, &join("X")).unwrap());
        assert_eq!(event.participants, vec!["X"]);

        // second join is a successful no-op, no broadcast owed
        assert!(!apply(&mut event, &join("X")).unwrap());
        assert_eq!(event.participants, vec!["X"]);
    }

    #[test]
    fn join_preserves_insertion_order() {
        let mut event = active_event();
        apply(&mut event, &join("X")).unwrap();
        apply(&mut event, &join("Y")).unwrap();
        apply(&mut event, &join("Z")).unwrap();
        assert_eq!(event.participants, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn leave_of_absent_user_is_a_noop() {
        let mut event = active_event();
        apply(&mut event, &join("X")).unwrap();

        let changed = apply(
            &mut event,
            &Mutation::Leave {
                user: "Y".to_string(),
            },
        )
        .unwrap();
        assert!(!changed);
        assert_eq!(event.participants, vec!["X"]);
    }

    #[test]
    fn leave_removes_participant() {
        let mut event = active_event();
        apply(&mut event, &join("X")).unwrap();

        let leave = Mutation::Leave {
            user: "X".to_string(),
        };
        assert!(apply(&mut event, &leave).unwrap());
        assert!(event.participants.is_empty());

        // leaving again changes nothing
        assert!(!apply(&mut event, &leave).unwrap());
    }

    #[test]
    fn cancel_requires_the_organizer() {
        let mut event = active_event();

        let err = apply(
            &mut event,
            &Mutation::Cancel {
                user: "Z".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, StoreError::Unauthorized { id: 1 });
        assert_eq!(event.status, EventStatus::Active);

        assert!(apply(
            &mut event,
            &Mutation::Cancel {
                user: "User A".to_string(),
            },
        )
        .unwrap());
        assert_eq!(event.status, EventStatus::Cancelled);
    }

    #[test]
    fn update_replaces_fields_and_revalidates_schedule() {
        let mut event = active_event();
        apply(&mut event, &join("X")).unwrap();
        let new_time = Utc::now() + Duration::days(14);

        let changed = apply(
            &mut event,
            &Mutation::Update {
                title: "Renamed".to_string(),
                organizer: "User B".to_string(),
                scheduled_at: new_time,
                location: "Venue B".to_string(),
            },
        )
        .unwrap();
        assert!(changed);
        assert_eq!(event.title, "Renamed");
        assert_eq!(event.organizer, "User B");
        assert_eq!(event.scheduled_at, new_time);
        assert_eq!(event.location, "Venue B");
        // participants and status survive a full update
        assert_eq!(event.participants, vec!["X"]);
        assert_eq!(event.status, EventStatus::Active);
    }

    #[test]
    fn update_with_past_schedule_leaves_record_untouched() {
        let mut event = active_event();
        let original = event.clone();

        let err = apply(
            &mut event,
            &Mutation::Update {
                title: "Renamed".to_string(),
                organizer: "User A".to_string(),
                scheduled_at: Utc::now() - Duration::hours(1),
                location: "Venue B".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(event, original);
    }

    #[test]
    fn cancelled_record_rejects_every_mutation() {
        let mut event = active_event();
        event.status = EventStatus::Cancelled;

        for mutation in [
            join("X"),
            Mutation::Leave {
                user: "X".to_string(),
            },
            Mutation::Cancel {
                user: "User A".to_string(),
            },
        ] {
            let err = apply(&mut event, &mutation).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        assert!(event.participants.is_empty());
    }
}
