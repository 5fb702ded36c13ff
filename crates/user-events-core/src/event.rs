//! Event and aggregate record types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded user action. Events are immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Server-assigned identifier.
    pub id: i64,
    /// The acting user. Always positive.
    pub user_id: i64,
    /// What the user did. Never empty.
    pub action: String,
    /// The `page` entry of the submitted metadata, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_page: Option<String>,
    /// Insertion time assigned by the store.
    pub created_at: DateTime<Utc>,
}

/// A validated event ready for insertion. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// The acting user.
    pub user_id: i64,
    /// What the user did.
    pub action: String,
    /// Projected `page` metadata entry.
    pub metadata_page: Option<String>,
}

/// A validated event query. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    /// Restrict to a single user; `None` matches every user.
    pub user_id: Option<i64>,
    /// Earliest `created_at` to include.
    pub start: DateTime<Utc>,
    /// Latest `created_at` to include.
    pub end: DateTime<Utc>,
}

impl EventFilter {
    /// Returns `true` if `event` satisfies every clause of the filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.user_id.is_none_or(|id| id == event.user_id)
            && event.created_at >= self.start
            && event.created_at <= self.end
    }
}

/// The half-open interval `[period_start, period_end)` covered by one
/// aggregation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    /// Inclusive lower bound; also the bucket key.
    pub period_start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub period_end: DateTime<Utc>,
}

impl AggregationWindow {
    /// The window of length `interval` ending at `period_end`.
    #[must_use]
    pub fn trailing(period_end: DateTime<Utc>, interval: TimeDelta) -> Self {
        Self {
            period_start: period_end - interval,
            period_end,
        }
    }

    /// Returns `true` if `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.period_start && instant < self.period_end
    }
}

/// Per-user event count for one aggregation window, keyed by
/// `(user_id, period_start)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCountBucket {
    /// The counted user.
    pub user_id: i64,
    /// Window start (inclusive).
    pub period_start: DateTime<Utc>,
    /// Window end (exclusive).
    pub period_end: DateTime<Utc>,
    /// Number of the user's events inside the window.
    pub event_count: i64,
}
