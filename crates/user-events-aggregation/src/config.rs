//! Aggregation interval configuration.

use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

/// Interval used when none is configured.
pub const DEFAULT_INTERVAL_SECS: i64 = 60;

/// Invalid scheduler configuration. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured value is not an integer, or is too large to represent.
    #[error("invalid AGGREGATION_INTERVAL_SECONDS={0:?}: must be a positive integer")]
    InvalidInterval(String),

    /// The configured value is zero or negative.
    #[error("invalid AGGREGATION_INTERVAL_SECONDS={0}: must be a positive integer")]
    NonPositiveInterval(i64),
}

/// Validated scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationConfig {
    interval_secs: u64,
    window_length: TimeDelta,
}

impl AggregationConfig {
    /// Builds a config that fires every `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NonPositiveInterval` if `secs <= 0` and
    /// `ConfigError::InvalidInterval` if it does not fit in a time delta.
    pub fn from_seconds(secs: i64) -> Result<Self, ConfigError> {
        if secs <= 0 {
            return Err(ConfigError::NonPositiveInterval(secs));
        }
        let window_length = TimeDelta::try_seconds(secs)
            .ok_or_else(|| ConfigError::InvalidInterval(secs.to_string()))?;
        let interval_secs =
            u64::try_from(secs).map_err(|_| ConfigError::InvalidInterval(secs.to_string()))?;

        Ok(Self {
            interval_secs,
            window_length,
        })
    }

    /// Parses the raw `AGGREGATION_INTERVAL_SECONDS` value. Absent or blank
    /// means the 60 second default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` for non-integer input and
    /// `ConfigError::NonPositiveInterval` for zero or negative input.
    pub fn from_env_value(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim) {
            None | Some("") => Self::from_seconds(DEFAULT_INTERVAL_SECS),
            Some(value) => {
                let secs = value
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidInterval(value.to_owned()))?;
                Self::from_seconds(secs)
            }
        }
    }

    /// Time between ticks.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Length of the window each tick aggregates; equal to the interval.
    #[must_use]
    pub fn window_length(&self) -> TimeDelta {
        self.window_length
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS.unsigned_abs(),
            window_length: TimeDelta::seconds(DEFAULT_INTERVAL_SECS),
        }
    }
}
