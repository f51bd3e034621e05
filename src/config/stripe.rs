//! Stripe configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Stripe API and webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub api_key: String,

    /// Stripe webhook signing secret
    pub webhook_secret: String,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Percent of the plan price credited per active referral
    #[serde(default = "default_referral_discount_percent")]
    pub referral_discount_percent: u8,

    /// Days to keep processed webhook event records
    #[serde(default = "default_event_retention_days")]
    pub event_retention_days: u32,
}

impl StripeConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.api_key.starts_with("sk_live_")
    }

    /// Validate Stripe configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if self.referral_discount_percent == 0 || self.referral_discount_percent > 100 {
            return Err(ValidationError::InvalidDiscountPercent);
        }
        if self.event_retention_days == 0 {
            return Err(ValidationError::InvalidRetentionDays);
        }

        Ok(())
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            webhook_secret: String::new(),
            api_base_url: default_api_base_url(),
            referral_discount_percent: default_referral_discount_percent(),
            event_retention_days: default_event_retention_days(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_referral_discount_percent() -> u8 {
    10
}

fn default_event_retention_days() -> u32 {
    30
}
