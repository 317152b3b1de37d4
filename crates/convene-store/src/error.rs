use thiserror::Error;

/// Errors surfaced synchronously to mutation callers.
///
/// Delivery failures never appear here; they are contained in the gateway's
/// dispatcher and only cost the failing subscriber its registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given id.
    #[error("event not found: {id}")]
    NotFound { id: u64 },

    /// A non-organizer attempted to cancel the event.
    #[error("only the organizer can cancel event {id}")]
    Unauthorized { id: u64 },

    /// The mutation failed a business invariant before any state changed.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl StoreError {
    /// Short error code string for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Unauthorized { .. } => "FORBIDDEN",
            StoreError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
