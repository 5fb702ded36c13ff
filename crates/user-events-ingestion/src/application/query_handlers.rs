//! Query handlers for the Ingestion context.
//!
//! This module validates event queries and returns read-only view DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use user_events_core::error::DomainError;
use user_events_core::event::Event;
use user_events_core::repository::EventRepository;

use crate::domain::queries::EventQuery;

/// Read-only view of a stored event.
#[derive(Debug, Serialize)]
pub struct EventView {
    /// The event identifier.
    pub id: i64,
    /// The acting user.
    pub user_id: i64,
    /// What the user did.
    pub action: String,
    /// The `page` metadata entry, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_page: Option<String>,
    /// Insertion time, serialized as RFC 3339.
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            action: event.action,
            metadata_page: event.metadata_page,
            created_at: event.created_at,
        }
    }
}

/// Retrieves events matching the query, newest first. An empty result is not
/// an error.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the query is invalid (the repository
/// is not called) and `DomainError::Storage` if the read fails.
pub async fn handle_get_events(
    query: &EventQuery,
    repo: &dyn EventRepository,
) -> Result<Vec<EventView>, DomainError> {
    let filter = query.validate()?;
    let events = repo.get_events(&filter).await?;
    Ok(events.into_iter().map(EventView::from).collect())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use user_events_core::error::{DomainError, ValidationError};
    use user_events_core::event::NewEvent;

    use crate::application::query_handlers::handle_get_events;
    use crate::domain::queries::EventQuery;
    use user_events_test_support::{
        FailingEventStore, FixedClock, InMemoryEventStore, RecordingEventRepository,
    };

    fn query(user_id: Option<&str>, from: &str, to: &str) -> EventQuery {
        EventQuery {
            user_id: user_id.map(str::to_owned),
            from: Some(from.to_owned()),
            to: Some(to.to_owned()),
        }
    }

    #[tokio::test]
    async fn test_handle_get_events_passes_validated_filter_to_store() {
        // Arrange
        let repo = RecordingEventRepository::default();

        // Act
        let result = handle_get_events(
            &query(Some("9"), "2025-01-01", "2025-01-01T06:00:00Z"),
            &repo,
        )
        .await;

        // Assert
        assert!(result.unwrap().is_empty());
        let queries = repo.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].user_id, Some(9));
        assert_eq!(
            queries[0].end,
            Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_handle_get_events_rejects_inverted_range_without_store_access() {
        // Arrange
        let repo = RecordingEventRepository::default();

        // Act
        let result = handle_get_events(
            &query(None, "2025-01-01T00:00:01Z", "2025-01-01T00:00:00Z"),
            &repo,
        )
        .await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidRange(_)))
        ));
        assert!(repo.queries().is_empty());
    }

    #[tokio::test]
    async fn test_handle_get_events_surfaces_storage_failure() {
        // Act
        let result =
            handle_get_events(&query(None, "2025-01-01", "2025-01-02"), &FailingEventStore).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[tokio::test]
    async fn test_page_metadata_round_trips_and_other_keys_do_not() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let store = InMemoryEventStore::new(FixedClock(now));
        let command = crate::domain::commands::RecordEvent {
            correlation_id: uuid::Uuid::new_v4(),
            user_id: 3,
            action: "view".to_owned(),
            metadata: Some(
                [("page", "X"), ("other", "Y")]
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            ),
        };
        crate::application::command_handlers::handle_record_event(&command, &store)
            .await
            .unwrap();

        // Act
        let views = handle_get_events(&query(Some("3"), "2025-01-01", "2025-01-02"), &store)
            .await
            .unwrap();

        // Assert
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].metadata_page.as_deref(), Some("X"));
        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json.get("other").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[tokio::test]
    async fn test_handle_get_events_returns_newest_first() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let store = InMemoryEventStore::new(FixedClock(now));
        for minutes in [30, 10, 20] {
            store.seed_event(
                &NewEvent {
                    user_id: 1,
                    action: format!("a{minutes}"),
                    metadata_page: None,
                },
                now - TimeDelta::minutes(minutes),
            );
        }

        // Act
        let views = handle_get_events(&query(None, "2025-01-01", "2025-01-01 12:00:00"), &store)
            .await
            .unwrap();

        // Assert
        let actions: Vec<&str> = views.iter().map(|v| v.action.as_str()).collect();
        assert_eq!(actions, vec!["a10", "a20", "a30"]);
    }
}
