//! HTTP adapter for billing webhook endpoints.
//!
//! Exposes the webhook receiver via REST API:
//! - `POST /stripe` - Receive Stripe webhook events
//! - `GET /health` - Liveness probe
//!
//! Unmatched routes answer with a JSON 404.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::{app, webhook_routes};
