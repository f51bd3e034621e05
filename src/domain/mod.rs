//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `billing` - Stripe webhook verification, event payloads, and billing rules

pub mod billing;
