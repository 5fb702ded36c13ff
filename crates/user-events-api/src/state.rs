//! Shared application state.

use std::sync::Arc;

use user_events_core::repository::{EventRepository, EventStore, StoreHealth};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event insert and query access.
    pub event_repository: Arc<dyn EventRepository>,
    /// Store reachability for the health endpoint.
    pub store_health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        store_health: Arc<dyn StoreHealth>,
    ) -> Self {
        Self {
            event_repository,
            store_health,
        }
    }

    /// Create application state backed by a single store.
    #[must_use]
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: EventStore + 'static,
    {
        Self::new(store.clone(), store.clone())
    }
}
