//! Billing domain: webhook signature verification, Stripe event payloads,
//! and the classification rules that drive post-ack side effects.

mod invoice;
mod outcome;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use invoice::{StripeInvoice, StripeInvoiceLineItem, StripeInvoiceLines, StripePlan};
pub use outcome::{DispatchOutcome, ProcessOutcome};
pub use stripe_event::{
    StripeEvent, StripeEventData, StripeEventType, StripeSource, StripeSubscription,
};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    SignatureHeader, StripeWebhookVerifier, MAX_CLOCK_SKEW_SECS, MAX_EVENT_AGE_SECS,
};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
