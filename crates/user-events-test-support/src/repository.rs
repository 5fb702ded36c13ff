//! Test stores: substitute implementations of the store capabilities.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use user_events_core::clock::Clock;
use user_events_core::error::DomainError;
use user_events_core::event::{AggregationWindow, Event, EventCountBucket, EventFilter, NewEvent};
use user_events_core::repository::{
    EventAggregator, EventRepository, HealthReport, HealthStatus, StoreHealth,
};

/// An event repository that records every `insert_event` and `get_events`
/// call. Inserts always succeed with sequential ids starting at 1, and
/// `get_events` returns the configured events regardless of the filter.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    load_result: Vec<Event>,
    inserted: Mutex<Vec<NewEvent>>,
    queries: Mutex<Vec<EventFilter>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `get_events` call.
    #[must_use]
    pub fn new(load_result: Vec<Event>) -> Self {
        Self {
            load_result,
            ..Self::default()
        }
    }

    /// Returns a snapshot of all events passed to `insert_event`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inserted_events(&self) -> Vec<NewEvent> {
        self.inserted.lock().unwrap().clone()
    }

    /// Returns a snapshot of all filters passed to `get_events`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn queries(&self) -> Vec<EventFilter> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn insert_event(&self, event: &NewEvent) -> Result<i64, DomainError> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(event.clone());
        Ok(i64::try_from(inserted.len()).unwrap_or(i64::MAX))
    }

    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>, DomainError> {
        self.queries.lock().unwrap().push(*filter);
        Ok(self.load_result.clone())
    }
}

/// A store whose every operation fails with a storage error and whose
/// health check reports the store as down. Useful for testing error paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventRepository for FailingEventStore {
    async fn insert_event(&self, _event: &NewEvent) -> Result<i64, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn get_events(&self, _filter: &EventFilter) -> Result<Vec<Event>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}

#[async_trait]
impl EventAggregator for FailingEventStore {
    async fn aggregate_events(&self, _window: &AggregationWindow) -> Result<u64, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}

#[async_trait]
impl StoreHealth for FailingEventStore {
    async fn health(&self) -> HealthReport {
        HealthReport {
            status: HealthStatus::Down,
            message: "db down: connection refused".to_owned(),
            open_connections: 0,
            idle_connections: 0,
        }
    }

    async fn close(&self) {}
}

#[derive(Debug, Default)]
struct InMemoryState {
    events: Vec<Event>,
    buckets: BTreeMap<(i64, DateTime<Utc>), EventCountBucket>,
    windows: Vec<AggregationWindow>,
    next_id: i64,
    closed: bool,
}

impl InMemoryState {
    fn push(&mut self, event: &NewEvent, created_at: DateTime<Utc>) -> i64 {
        self.next_id += 1;
        self.events.push(Event {
            id: self.next_id,
            user_id: event.user_id,
            action: event.action.clone(),
            metadata_page: event.metadata_page.clone(),
            created_at,
        });
        self.next_id
    }
}

/// A fully functional store held in memory. Inserted events are stamped with
/// the injected clock; `seed_event` places an event at an arbitrary instant.
/// Query ordering and bucket upserts behave like the `PostgreSQL` store.
pub struct InMemoryEventStore {
    clock: Box<dyn Clock>,
    state: Mutex<InMemoryState>,
}

impl InMemoryEventStore {
    /// Create an empty store that stamps inserts with `clock`.
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            state: Mutex::new(InMemoryState::default()),
        }
    }

    /// Insert an event with an explicit `created_at`, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_event(&self, event: &NewEvent, created_at: DateTime<Utc>) -> i64 {
        self.state.lock().unwrap().push(event, created_at)
    }

    /// Returns every bucket currently stored, ordered by `(user_id, period_start)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn buckets(&self) -> Vec<EventCountBucket> {
        self.state.lock().unwrap().buckets.values().cloned().collect()
    }

    /// Returns every window passed to `aggregate_events`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn aggregated_windows(&self) -> Vec<AggregationWindow> {
        self.state.lock().unwrap().windows.clone()
    }

    /// Returns `true` once `close` has been called.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    async fn insert_event(&self, event: &NewEvent) -> Result<i64, DomainError> {
        let created_at = self.clock.now();
        Ok(self.state.lock().unwrap().push(event, created_at))
    }

    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(events)
    }
}

#[async_trait]
impl EventAggregator for InMemoryEventStore {
    async fn aggregate_events(&self, window: &AggregationWindow) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.windows.push(*window);

        let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
        for event in state.events.iter().filter(|e| window.contains(e.created_at)) {
            *counts.entry(event.user_id).or_default() += 1;
        }

        let written = counts.len() as u64;
        for (user_id, event_count) in counts {
            state.buckets.insert(
                (user_id, window.period_start),
                EventCountBucket {
                    user_id,
                    period_start: window.period_start,
                    period_end: window.period_end,
                    event_count,
                },
            );
        }
        Ok(written)
    }
}

#[async_trait]
impl StoreHealth for InMemoryEventStore {
    async fn health(&self) -> HealthReport {
        HealthReport {
            status: HealthStatus::Up,
            message: "It's healthy".to_owned(),
            open_connections: 1,
            idle_connections: 1,
        }
    }

    async fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedClock;
    use chrono::{TimeDelta, TimeZone};

    fn new_event(user_id: i64) -> NewEvent {
        NewEvent {
            user_id,
            action: "click".to_owned(),
            metadata_page: None,
        }
    }

    #[tokio::test]
    async fn test_in_memory_upsert_overwrites_instead_of_accumulating() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 10, 1, 0).unwrap();
        let store = InMemoryEventStore::new(FixedClock(now));
        store.seed_event(&new_event(1), now - TimeDelta::seconds(30));
        let window = AggregationWindow::trailing(now, TimeDelta::seconds(60));

        store.aggregate_events(&window).await.unwrap();
        store.aggregate_events(&window).await.unwrap();

        let buckets = store.buckets();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].event_count, 1);
        assert_eq!(store.aggregated_windows().len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_orders_ties_by_descending_id() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let store = InMemoryEventStore::new(FixedClock(now));
        let first = store.insert_event(&new_event(1)).await.unwrap();
        let second = store.insert_event(&new_event(1)).await.unwrap();
        let filter = EventFilter {
            user_id: None,
            start: now,
            end: now,
        };

        let events = store.get_events(&filter).await.unwrap();

        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second, first]);
    }
}
