//! Shared test mocks and utilities for the user events service.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{FailingEventStore, InMemoryEventStore, RecordingEventRepository};
