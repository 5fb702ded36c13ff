//! Queries for the Ingestion context.

use serde::Deserialize;
use user_events_core::error::{TimeParseError, ValidationError};
use user_events_core::event::EventFilter;

use crate::domain::timestamp::parse_flexible;

/// Raw event query as received from the query string. Every field is kept as
/// text so validation, not deserialization, decides what is acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    /// Optional user filter; empty means "all users".
    pub user_id: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<String>,
    /// Inclusive upper bound. Required; never defaulted to the current time.
    pub to: Option<String>,
}

impl EventQuery {
    /// Validates the query and converts it into a store filter.
    ///
    /// # Errors
    ///
    /// - `ValidationError::InvalidUserId` if `user_id` is not an integer.
    /// - `ValidationError::InvalidRange` if `user_id <= 0` or `from` is after `to`.
    /// - `ValidationError::InvalidTime` if `from` or `to` is missing or unparseable.
    pub fn validate(&self) -> Result<EventFilter, ValidationError> {
        let user_id = match self.user_id.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| ValidationError::InvalidUserId(raw.to_owned()))?,
            ),
        };
        if user_id.is_some_and(|id| id <= 0) {
            return Err(ValidationError::InvalidRange(
                "user_id must be a positive integer".into(),
            ));
        }

        let start = parse_bound("from", self.from.as_deref())?;
        let end = parse_bound("to", self.to.as_deref())?;
        if start > end {
            return Err(ValidationError::InvalidRange(
                "from must be before or equal to to".into(),
            ));
        }

        Ok(EventFilter {
            user_id,
            start,
            end,
        })
    }
}

fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
) -> Result<chrono::DateTime<chrono::Utc>, ValidationError> {
    let raw = raw.ok_or(ValidationError::InvalidTime {
        field,
        source: TimeParseError::Empty,
    })?;
    parse_flexible(raw).map_err(|source| ValidationError::InvalidTime { field, source })
}
