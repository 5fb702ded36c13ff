//! Commands for the Ingestion context.

use std::collections::HashMap;

use user_events_core::error::ValidationError;
use user_events_core::event::NewEvent;
use uuid::Uuid;

/// The only metadata key that is persisted.
pub const PAGE_METADATA_KEY: &str = "page";

/// Command to record a single user event.
#[derive(Debug, Clone)]
pub struct RecordEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The acting user.
    pub user_id: i64,
    /// What the user did.
    pub action: String,
    /// Free-form metadata; only the `page` entry is kept.
    pub metadata: Option<HashMap<String, String>>,
}

impl RecordEvent {
    /// Validates the command and projects it onto the persisted shape.
    ///
    /// Every metadata key other than `page` is dropped here; the event table
    /// has no column for them.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonPositiveUserId` if `user_id <= 0` and
    /// `ValidationError::EmptyAction` if `action` is empty.
    pub fn to_new_event(&self) -> Result<NewEvent, ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::NonPositiveUserId);
        }
        if self.action.is_empty() {
            return Err(ValidationError::EmptyAction);
        }

        let metadata_page = self
            .metadata
            .as_ref()
            .and_then(|m| m.get(PAGE_METADATA_KEY))
            .cloned();

        Ok(NewEvent {
            user_id: self.user_id,
            action: self.action.clone(),
            metadata_page,
        })
    }
}
