//! Axum router configuration for the webhook service.
//!
//! Wires the billing endpoints to their handlers and applies the
//! service-wide middleware stack.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_stripe_webhook, health_check, not_found, BillingAppState};

/// Create the Stripe webhook router.
///
/// No session auth here: the signature check inside the handler is the
/// authentication.
///
/// # Routes
/// - `POST /stripe` - Receive Stripe webhook events
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete application router.
///
/// Merges the webhook routes at the root, adds the health probe, and
/// applies request IDs, tracing, and a request timeout. Unmatched routes get
/// a JSON 404.
pub fn app(state: BillingAppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(webhook_routes())
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
