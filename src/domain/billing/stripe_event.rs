//! Stripe event envelope and payload types.
//!
//! These types represent Stripe API objects as they arrive in webhook
//! payloads. The envelope keeps the inner object as raw JSON so each
//! handler can deserialize only the shape it needs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::webhook_errors::WebhookError;

/// Raw Stripe webhook event as received from the API.
///
/// This represents the full event envelope containing metadata and payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "invoice.payment_succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: StripeEventData,

    /// Whether this is a live or test event.
    pub livemode: bool,

    /// Stripe API version used for this event.
    pub api_version: Option<String>,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Returns true for events generated against live-mode API keys.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Returns true for events generated against test-mode API keys.
    pub fn is_test(&self) -> bool {
        !self.livemode
    }

    /// Map the raw event type string onto the handled event set.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_str(&self.event_type)
    }

    /// Deserialize the inner `data.object` into a concrete payload type.
    pub fn deserialize_object<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

/// Event types this service reacts to.
///
/// Anything else arrives as `Unknown` carrying the raw type string so
/// it can be acknowledged and recorded without a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEventType {
    /// `customer.subscription.trial_will_end`
    TrialWillEnd,
    /// `customer.source.expiring`
    SourceExpiring,
    /// `invoice.created`
    InvoiceCreated,
    /// `invoice.payment_failed`
    InvoicePaymentFailed,
    /// `invoice.payment_succeeded`
    InvoicePaymentSucceeded,
    /// Any event type without a registered handler.
    Unknown(String),
}

impl StripeEventType {
    /// Map a raw Stripe event type string to the handled set.
    pub fn from_str(raw: &str) -> Self {
        match raw {
            "customer.subscription.trial_will_end" => Self::TrialWillEnd,
            "customer.source.expiring" => Self::SourceExpiring,
            "invoice.created" => Self::InvoiceCreated,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The raw Stripe event type string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::TrialWillEnd => "customer.subscription.trial_will_end",
            Self::SourceExpiring => "customer.source.expiring",
            Self::InvoiceCreated => "invoice.created",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Stripe Subscription object, reduced to the fields trial handling needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Customer ID owning this subscription.
    pub customer: String,

    /// When cancellation was requested (Unix timestamp).
    pub canceled_at: Option<i64>,
}

/// Stripe Source object (card or other payment source).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSource {
    /// Customer ID the source belongs to.
    pub customer: String,
}

/// Builds event envelopes for tests without hand-writing JSON envelopes.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
    api_version: Option<String>,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "invoice.created".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn event_type(mut self, event_type: &str) -> Self {
        self.event_type = event_type.to_string();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: self.api_version,
        }
    }
}
