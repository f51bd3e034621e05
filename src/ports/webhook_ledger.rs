//! WebhookLedger port - Interface for tracking processed Stripe webhooks.
//!
//! This port enables idempotent webhook handling by tracking which event
//! IDs have already been dispatched. Stripe may deliver the same webhook
//! multiple times due to:
//! - Network timeouts
//! - Our endpoint returning success but Stripe not receiving it
//!
//! The ledger is advisory: a broken ledger degrades dedup, never
//! availability. Callers dispatch anyway when a ledger call fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type of Stripe event (e.g., "invoice.payment_succeeded").
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    /// Result of processing: "success" or "recovered".
    pub outcome: String,

    /// Error message if the handler failed after the ack.
    pub error_message: Option<String>,
}

impl ProcessedEvent {
    /// Creates a record for an event whose handler completed.
    pub fn success(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: "success".to_string(),
            error_message: None,
        }
    }

    /// Creates a record for an event whose handler failed post-ack.
    pub fn recovered(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: "recovered".to_string(),
            error_message: Some(error.into()),
        }
    }
}

/// Result of attempting to record a processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for storing and retrieving processed webhook events.
///
/// Implementations should use database constraints (PRIMARY KEY on
/// event_id) to prevent race conditions during concurrent deliveries.
#[async_trait]
pub trait WebhookLedger: Send + Sync {
    /// Find a previously processed event by its Stripe event ID.
    ///
    /// Returns `None` if the event hasn't been processed yet.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, LedgerError>;

    /// Attempt to record a processed event.
    ///
    /// Idempotent on event ID: concurrent deliveries racing to record
    /// the same event yield exactly one `Inserted`, everyone else sees
    /// `AlreadyExists`.
    async fn record(&self, event: ProcessedEvent) -> Result<SaveResult, LedgerError>;

    /// Delete records processed before the cutoff.
    ///
    /// Returns the number of records deleted. Used by the retention
    /// sweep (e.g., keep 30 days).
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError>;
}
