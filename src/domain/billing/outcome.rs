//! Dispatch outcomes for acknowledged webhook events.
//!
//! Once an event is acknowledged, every handler result collapses into a
//! uniform outcome: the work either succeeded or failed in a way we can
//! only log and record. Nothing after the ack can change the HTTP
//! response Stripe already received.

use super::webhook_errors::WebhookError;

/// Result of dispatching an acknowledged event to its handler.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler completed all side effects.
    Success,
    /// The handler failed after the ack; the error is recorded, not returned.
    Recovered(WebhookError),
}

impl DispatchOutcome {
    /// Returns true if the handler completed without error.
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }

    /// Emit the single log line that reports how this event went.
    pub fn report(&self, event_id: &str, event_type: &str) {
        match self {
            DispatchOutcome::Success => {
                tracing::info!(event_id, event_type, "webhook event handled");
            }
            DispatchOutcome::Recovered(err) => {
                tracing::error!(
                    event_id,
                    event_type,
                    error = %err,
                    "webhook event failed after acknowledgement"
                );
            }
        }
    }
}

/// Result of running the full pipeline for a delivered event.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Event was dispatched and its outcome recorded.
    Completed(DispatchOutcome),
    /// Event ID was already in the ledger; dispatch was skipped.
    Duplicate,
}

impl ProcessOutcome {
    /// Returns true if the event was skipped as a duplicate delivery.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ProcessOutcome::Duplicate)
    }
}
