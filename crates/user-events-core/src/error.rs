//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Well-formed input that is semantically invalid. The store is never
    /// touched when this is returned.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The underlying store failed (constraint violation, connection loss).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Reasons an event creation or event query request is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `user_id` on an event creation request is zero or negative.
    #[error("user_id must be a positive integer")]
    NonPositiveUserId,

    /// `action` on an event creation request is empty.
    #[error("action is required")]
    EmptyAction,

    /// The `user_id` query parameter is not an integer.
    #[error("user_id must be an integer, got {0:?}")]
    InvalidUserId(String),

    /// A `from`/`to` parameter could not be interpreted as a point in time.
    #[error("invalid {field} parameter: {source}")]
    InvalidTime {
        /// Name of the offending query parameter.
        field: &'static str,
        /// Why parsing failed.
        #[source]
        source: TimeParseError,
    },

    /// The query range is unusable: a non-positive `user_id` filter or
    /// `from` strictly after `to`.
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

/// Failure modes of flexible timestamp parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    /// The value was absent, empty, or only whitespace after decoding.
    #[error("empty time string")]
    Empty,

    /// None of the accepted layouts matched.
    #[error("unrecognized time format: {0:?}")]
    UnrecognizedFormat(String),
}
