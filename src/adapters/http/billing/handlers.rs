//! HTTP handlers for billing webhook endpoints.
//!
//! These handlers connect Axum routes to the application layer. The webhook
//! endpoint acknowledges events as soon as the signature checks out and runs
//! the business rules afterwards, so Stripe never retries an event we have
//! already accepted.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;

use crate::application::handlers::billing::ProcessWebhookHandler;
use crate::domain::billing::{StripeWebhookVerifier, WebhookError};
use crate::ports::{DiscountApplier, Mailer, UserDirectory, WebhookLedger};

use super::dto::{ErrorResponse, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct BillingAppState {
    pub verifier: Arc<StripeWebhookVerifier>,
    pub users: Arc<dyn UserDirectory>,
    pub mailer: Arc<dyn Mailer>,
    pub discounts: Arc<dyn DiscountApplier>,
    pub ledger: Arc<dyn WebhookLedger>,
    /// Domain name reported by the health endpoint.
    pub domain: String,
}

impl BillingAppState {
    /// Create the webhook processing handler from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.users.clone(),
            self.mailer.clone(),
            self.discounts.clone(),
            self.ledger.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /stripe - Receive a Stripe webhook event
///
/// Verifies the signature against the raw request bytes, then acknowledges
/// with a 200 naming the event ID. Business rules run in a spawned task after
/// the acknowledgement; their failures are recorded in the event ledger
/// instead of being returned, because a non-2xx here would make Stripe retry
/// an event we already accepted.
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignatureHeader)?;

    let event = state.verifier.verify_and_parse(&body, signature)?;

    let ack = format!("Signed Webhook Received: {}", event.id);

    let handler = state.webhook_handler();
    tokio::spawn(async move {
        handler.process(event).await;
    });

    Ok((StatusCode::OK, ack))
}

/// GET /health - Liveness probe reporting the serving domain
pub async fn health_check(State(state): State<BillingAppState>) -> impl IntoResponse {
    Json(HealthResponse {
        message: format!("OK from {}", state.domain),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::error!(path = %uri, "route not found");
    let body = ErrorResponse::with_details(
        "NOT_FOUND",
        "Not Found",
        serde_json::json!({ "path": uri.to_string() }),
    );
    (StatusCode::NOT_FOUND, Json(body))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
pub struct BillingApiError(WebhookError);

impl From<WebhookError> for BillingApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let error_code = match &self.0 {
            WebhookError::MissingSignatureHeader => "MISSING_SIGNATURE_HEADER",
            WebhookError::InvalidSignature => "INVALID_WEBHOOK_SIGNATURE",
            WebhookError::TimestampOutOfRange => "WEBHOOK_TIMESTAMP_EXPIRED",
            WebhookError::InvalidTimestamp => "WEBHOOK_TIMESTAMP_INVALID",
            WebhookError::ParseError(_) => "WEBHOOK_PARSE_FAILED",
            // Post-ack errors never surface here, but the mapping stays total
            _ => "INTERNAL_ERROR",
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}
