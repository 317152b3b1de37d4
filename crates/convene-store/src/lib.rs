pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{ApplyOutcome, EventStore};
pub use types::{Event, EventStatus, Mutation, NewEvent};
