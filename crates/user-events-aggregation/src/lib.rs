//! User Events: Aggregation.
//!
//! Rolls individual events up into per-user count buckets on a fixed
//! interval. Each tick covers the trailing interval ending at the moment it
//! fires and upserts one bucket per active user.

pub mod config;
pub mod scheduler;
pub mod tick;

pub use config::{AggregationConfig, ConfigError};
pub use scheduler::{AggregationScheduler, SchedulerState};
pub use tick::{TickOutcome, run_aggregation_tick};
