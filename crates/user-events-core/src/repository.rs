//! Store capability traits.
//!
//! The store is split into narrow capabilities so the HTTP layer, the
//! aggregation scheduler and the process entry point can each depend on
//! exactly what they use, and each can be substituted in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DomainError;
use crate::event::{AggregationWindow, Event, EventFilter, NewEvent};

/// Insert and filtered-read access to individual events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append one event and return its server-assigned id. `created_at` is
    /// set by the store to the insertion time.
    async fn insert_event(&self, event: &NewEvent) -> Result<i64, DomainError>;

    /// Load events matching `filter`, newest first. Events sharing a
    /// `created_at` are ordered by descending id.
    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>, DomainError>;
}

/// Roll-up of events into per-user count buckets.
#[async_trait]
pub trait EventAggregator: Send + Sync {
    /// Count each user's events inside `window` and upsert one bucket per
    /// user keyed by `(user_id, window.period_start)`, overwriting any
    /// existing count. Returns the number of buckets written.
    async fn aggregate_events(&self, window: &AggregationWindow) -> Result<u64, DomainError>;
}

/// Whether the store is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The store answered a ping.
    Up,
    /// The store could not be reached.
    Down,
}

/// Store health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Reachability.
    pub status: HealthStatus,
    /// Human-readable summary.
    pub message: String,
    /// Connections currently open in the pool.
    pub open_connections: u32,
    /// Open connections that are idle.
    pub idle_connections: u32,
}

/// Lifecycle operations on the store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Ping the store and report pool statistics.
    async fn health(&self) -> HealthReport;

    /// Release all connections. Further calls on the store fail.
    async fn close(&self);
}

/// Every store capability at once; implemented for anything that provides
/// all of them.
pub trait EventStore: EventRepository + EventAggregator + StoreHealth {}

impl<T> EventStore for T where T: EventRepository + EventAggregator + StoreHealth {}
