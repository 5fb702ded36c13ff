//! A single aggregation tick.

use chrono::TimeDelta;
use tracing::info;
use user_events_core::clock::Clock;
use user_events_core::error::DomainError;
use user_events_core::event::AggregationWindow;
use user_events_core::repository::EventAggregator;

/// Result of a successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// The window that was aggregated.
    pub window: AggregationWindow,
    /// Number of buckets written (one per user with events in the window).
    pub buckets_written: u64,
}

/// Aggregates the trailing `window_length` ending at `clock.now()`.
///
/// Re-running with the same clock reading overwrites the same buckets rather
/// than adding to them.
///
/// # Errors
///
/// Returns whatever the aggregator returns; nothing is retried.
pub async fn run_aggregation_tick(
    aggregator: &dyn EventAggregator,
    clock: &dyn Clock,
    window_length: TimeDelta,
) -> Result<TickOutcome, DomainError> {
    let window = AggregationWindow::trailing(clock.now(), window_length);
    info!(
        period_start = %window.period_start,
        period_end = %window.period_end,
        "aggregation started"
    );

    let buckets_written = aggregator.aggregate_events(&window).await?;

    Ok(TickOutcome {
        window,
        buckets_written,
    })
}
