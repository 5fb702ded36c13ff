//! Recurring aggregation on a tokio timer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use user_events_core::clock::Clock;
use user_events_core::repository::EventAggregator;

use crate::config::AggregationConfig;
use crate::tick::run_aggregation_tick;

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer is running.
    Stopped,
    /// The timer is running and ticks fire every interval.
    Running,
}

struct RunningJob {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Fires an aggregation tick every configured interval while running.
///
/// The first tick fires one full interval after `start`. A failed tick is
/// logged and the next one proceeds on schedule. `stop` ends the timer
/// without waiting for or cancelling a tick that is already in flight.
pub struct AggregationScheduler {
    aggregator: Arc<dyn EventAggregator>,
    clock: Arc<dyn Clock>,
    config: AggregationConfig,
    job: Mutex<Option<RunningJob>>,
}

impl AggregationScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(
        aggregator: Arc<dyn EventAggregator>,
        clock: Arc<dyn Clock>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            aggregator,
            clock,
            config,
            job: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        let job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        match job.as_ref() {
            Some(running) if !running.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Starts the timer. Calling `start` on a running scheduler does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        if job
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            debug!("aggregation scheduler already running");
            return;
        }

        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.clock),
            self.config.interval(),
            self.config.window_length(),
            stopped,
        ));
        *job = Some(RunningJob { stop, handle });

        info!(
            interval_seconds = self.config.interval().as_secs(),
            "aggregation scheduler started"
        );
    }

    /// Stops the timer. Calling `stop` on a stopped scheduler does nothing.
    pub fn stop(&self) {
        let running = self
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            // The loop may already have exited; a closed channel is fine.
            let _ = running.stop.send(());
            info!("aggregation scheduler stopped");
        }
    }
}

async fn run_loop(
    aggregator: Arc<dyn EventAggregator>,
    clock: Arc<dyn Clock>,
    period: Duration,
    window_length: TimeDelta,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = ticker.tick() => {}
        }

        // Runs to completion even if stop is requested meanwhile.
        match run_aggregation_tick(aggregator.as_ref(), clock.as_ref(), window_length).await {
            Ok(outcome) => info!(
                buckets_written = outcome.buckets_written,
                period_start = %outcome.window.period_start,
                period_end = %outcome.window.period_end,
                "aggregation completed"
            ),
            Err(e) => error!(error = %e, "aggregation failed"),
        }
    }
}
