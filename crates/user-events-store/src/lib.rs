//! `PostgreSQL` storage for the user events service.
//!
//! Owns the `events` and `user_event_counts` tables. Schema changes live in
//! the workspace `migrations/` directory and are embedded at compile time.

pub mod pg_event_store;

pub use pg_event_store::PgEventStore;
