//! `PostgreSQL` implementation of the store capability traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::migrate::MigrateError;
use tracing::warn;

use user_events_core::error::DomainError;
use user_events_core::event::{AggregationWindow, Event, EventFilter, NewEvent};
use user_events_core::repository::{
    EventAggregator, EventRepository, HealthReport, HealthStatus, StoreHealth,
};

/// Upper bound on a health-check ping.
const PING_TIMEOUT: Duration = Duration::from_secs(1);

const INSERT_EVENT: &str = r"
INSERT INTO events (user_id, action, metadata_page)
VALUES ($1, $2, $3)
RETURNING id
";

const SELECT_EVENTS: &str = r"
SELECT id, user_id, action, metadata_page, created_at
FROM events
WHERE ($1::bigint IS NULL OR user_id = $1)
  AND created_at >= $2
  AND created_at <= $3
ORDER BY created_at DESC, id DESC
";

const UPSERT_EVENT_COUNTS: &str = r"
INSERT INTO user_event_counts (user_id, period_start, period_end, event_count)
SELECT user_id, $1::timestamptz, $2::timestamptz, COUNT(*)
FROM events
WHERE created_at >= $1::timestamptz AND created_at < $2::timestamptz
GROUP BY user_id
ON CONFLICT (user_id, period_start)
DO UPDATE SET event_count = EXCLUDED.event_count
";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i32,
    user_id: i64,
    action: String,
    metadata_page: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: i64::from(row.id),
            user_id: row.user_id,
            action: row.action,
            metadata_page: row.metadata_page,
            created_at: row.created_at,
        }
    }
}

fn storage_error(context: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Storage(format!("{context}: {err}"))
}

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if a migration fails or the applied history
    /// diverges from the embedded one.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl EventRepository for PgEventStore {
    async fn insert_event(&self, event: &NewEvent) -> Result<i64, DomainError> {
        let id: i32 = sqlx::query_scalar(INSERT_EVENT)
            .bind(event.user_id)
            .bind(&event.action)
            .bind(event.metadata_page.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("insert event", &e))?;
        Ok(i64::from(id))
    }

    async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(SELECT_EVENTS)
            .bind(filter.user_id)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("query events", &e))?;
        Ok(rows.into_iter().map(Event::from).collect())
    }
}

#[async_trait]
impl EventAggregator for PgEventStore {
    async fn aggregate_events(&self, window: &AggregationWindow) -> Result<u64, DomainError> {
        let result = sqlx::query(UPSERT_EVENT_COUNTS)
            .bind(window.period_start)
            .bind(window.period_end)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("aggregate events", &e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StoreHealth for PgEventStore {
    async fn health(&self) -> HealthReport {
        let open_connections = self.pool.size();
        let idle_connections = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);

        let ping = tokio::time::timeout(
            PING_TIMEOUT,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await;

        let (status, message) = match ping {
            Ok(Ok(_)) => (HealthStatus::Up, "It's healthy".to_owned()),
            Ok(Err(e)) => (HealthStatus::Down, format!("db down: {e}")),
            Err(_) => (
                HealthStatus::Down,
                format!("db down: no reply within {}ms", PING_TIMEOUT.as_millis()),
            ),
        };
        if status == HealthStatus::Down {
            warn!(%message, "database health check failed");
        }

        HealthReport {
            status,
            message,
            open_connections,
            idle_connections,
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
