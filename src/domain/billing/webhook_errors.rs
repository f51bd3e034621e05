//! Webhook error types for Stripe webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping for the responses sent before the ack.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Request arrived without a `Stripe-Signature` header.
    #[error("Missing Stripe-Signature header")]
    MissingSignatureHeader,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Event timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event type has no registered handler.
    #[error("Unknown event type from Stripe: {0}")]
    UnknownEventType(String),

    /// Invoice payload carried no subscription line item.
    #[error("Invoice has no subscription line item")]
    MissingSubscriptionLineItem,

    /// Could not resolve the Stripe customer to a local user.
    #[error("User lookup failed: {0}")]
    UserLookup(String),

    /// Transactional email could not be sent.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Referral credit could not be applied.
    #[error("Discount application failed: {0}")]
    Discount(String),

    /// Processed-event ledger operation failed.
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl WebhookError {
    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine Stripe's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Signature failures
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            // Malformed requests
            WebhookError::MissingSignatureHeader
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            // Post-ack failures, logged not returned
            WebhookError::UnknownEventType(_)
            | WebhookError::MissingSubscriptionLineItem
            | WebhookError::UserLookup(_)
            | WebhookError::Notification(_)
            | WebhookError::Discount(_)
            | WebhookError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
