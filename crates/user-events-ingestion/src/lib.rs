//! User Events: Ingestion bounded context.
//!
//! Responsible for validating inbound event-creation payloads and query
//! filters, including flexible timestamp parsing, and for handing the
//! normalized result to the event store.

pub mod application;
pub mod domain;
