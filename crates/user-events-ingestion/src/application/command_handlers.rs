//! Command handlers for the Ingestion context.
//!
//! Handlers validate the command first and only then touch the repository,
//! so a rejected command never reaches the store.

use tracing::debug;
use user_events_core::error::DomainError;
use user_events_core::repository::EventRepository;

use crate::domain::commands::RecordEvent;

/// Handles the `RecordEvent` command: validates it, projects the metadata and
/// inserts exactly one event.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the command is invalid and
/// `DomainError::Storage` if the insert fails. Storage failures are not
/// retried.
pub async fn handle_record_event(
    command: &RecordEvent,
    repo: &dyn EventRepository,
) -> Result<i64, DomainError> {
    let new_event = command.to_new_event()?;

    let event_id = repo.insert_event(&new_event).await?;

    debug!(
        correlation_id = %command.correlation_id,
        event_id,
        user_id = new_event.user_id,
        "event recorded"
    );

    Ok(event_id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use user_events_core::error::{DomainError, ValidationError};
    use uuid::Uuid;

    use crate::application::command_handlers::handle_record_event;
    use crate::domain::commands::RecordEvent;
    use user_events_test_support::{FailingEventStore, RecordingEventRepository};

    fn command(user_id: i64, action: &str) -> RecordEvent {
        RecordEvent {
            correlation_id: Uuid::new_v4(),
            user_id,
            action: action.to_owned(),
            metadata: Some(HashMap::from([
                ("page".to_owned(), "/home".to_owned()),
                ("referrer".to_owned(), "search".to_owned()),
            ])),
        }
    }

    #[tokio::test]
    async fn test_handle_record_event_inserts_exactly_once() {
        // Arrange
        let repo = RecordingEventRepository::default();

        // Act
        let result = handle_record_event(&command(7, "click"), &repo).await;

        // Assert
        assert_eq!(result.unwrap(), 1);

        let inserted = repo.inserted_events();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].user_id, 7);
        assert_eq!(inserted[0].action, "click");
        assert_eq!(inserted[0].metadata_page.as_deref(), Some("/home"));
    }

    #[tokio::test]
    async fn test_handle_record_event_rejects_non_positive_user_without_store_access() {
        // Arrange
        let repo = RecordingEventRepository::default();

        // Act
        for user_id in [0, -1, -1000] {
            let result = handle_record_event(&command(user_id, "click"), &repo).await;

            // Assert
            assert!(matches!(
                result,
                Err(DomainError::Validation(ValidationError::NonPositiveUserId))
            ));
        }
        assert!(repo.inserted_events().is_empty());
    }

    #[tokio::test]
    async fn test_handle_record_event_rejects_empty_action_without_store_access() {
        // Arrange
        let repo = RecordingEventRepository::default();

        // Act
        let result = handle_record_event(&command(1, ""), &repo).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::EmptyAction))
        ));
        assert!(repo.inserted_events().is_empty());
    }

    #[tokio::test]
    async fn test_handle_record_event_surfaces_storage_failure() {
        // Act
        let result = handle_record_event(&command(1, "click"), &FailingEventStore).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }
}
