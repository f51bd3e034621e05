//! PostgreSQL implementation of WebhookLedger.
//!
//! One row per processed Stripe event. The primary key on event_id makes
//! recording idempotent under concurrent deliveries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::ports::{LedgerError, ProcessedEvent, SaveResult, WebhookLedger};

/// PostgreSQL implementation of the WebhookLedger port.
pub struct PostgresWebhookLedger {
    pool: PgPool,
}

impl PostgresWebhookLedger {
    /// Creates a new PostgresWebhookLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a processed event.
#[derive(Debug, sqlx::FromRow)]
struct ProcessedEventRow {
    event_id: String,
    event_type: String,
    processed_at: DateTime<Utc>,
    outcome: String,
    error_message: Option<String>,
}

impl From<ProcessedEventRow> for ProcessedEvent {
    fn from(row: ProcessedEventRow) -> Self {
        Self {
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: row.processed_at,
            outcome: row.outcome,
            error_message: row.error_message,
        }
    }
}

#[async_trait]
impl WebhookLedger for PostgresWebhookLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, LedgerError> {
        let row: Option<ProcessedEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, processed_at, outcome, error_message
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(format!("Failed to find event: {}", e)))?;

        Ok(row.map(ProcessedEvent::from))
    }

    async fn record(&self, event: ProcessedEvent) -> Result<SaveResult, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, processed_at, outcome, error_message)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.event_type)
        .bind(event.processed_at)
        .bind(&event.outcome)
        .bind(&event.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(format!("Failed to record event: {}", e)))?;

        // Concurrent deliveries race to insert; the loser sees no rows
        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(format!("Failed to prune events: {}", e)))?;

        Ok(result.rows_affected())
    }
}
