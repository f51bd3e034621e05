//! Adapters - Implementations of port interfaces.
//!
//! - `email` - Resend transactional email
//! - `http` - Axum handlers and routes for the webhook endpoint
//! - `postgres` - PostgreSQL repositories
//! - `stripe` - Outbound Stripe API client

pub mod email;
pub mod http;
pub mod postgres;
pub mod stripe;
