//! Stripe API adapter.
//!
//! Implements the `DiscountApplier` port for Stripe integration. Webhook
//! signature verification lives in the domain layer; this adapter only
//! speaks the outbound REST API.
//!
//! # Security
//!
//! - All secrets are handled via `secrecy::SecretString`
//! - API authentication uses HTTP basic auth with the secret key

mod discount_client;

pub use discount_client::{StripeClientConfig, StripeDiscountClient};
