//! Stripe discount client.
//!
//! Implements the `DiscountApplier` port against the Stripe API. Referral
//! credits are posted as negative invoice items, so they land on the draft
//! invoice Stripe is about to finalize.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeClientConfig::new(api_key, 10);
//! let client = StripeDiscountClient::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{DiscountApplier, DiscountError, Referral};

/// Stripe API client configuration.
#[derive(Clone)]
pub struct StripeClientConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Discount per active referral, in percent of the plan amount.
    referral_discount_percent: u8,
}

impl StripeClientConfig {
    /// Create a new Stripe client configuration.
    pub fn new(api_key: impl Into<String>, referral_discount_percent: u8) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            referral_discount_percent,
        }
    }

    /// Set a custom API base URL (for stripe-mock in tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe plan object, reduced to the field the credit math needs.
#[derive(Debug, Deserialize)]
struct PlanObject {
    /// Amount in the smallest currency unit; null for tiered plans.
    amount: Option<i64>,
}

/// Stripe-backed discount applier.
pub struct StripeDiscountClient {
    config: StripeClientConfig,
    http_client: reqwest::Client,
}

impl StripeDiscountClient {
    /// Create a new discount client with the given configuration.
    pub fn new(config: StripeClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn fetch_plan(&self, plan_id: &str) -> Result<PlanObject, DiscountError> {
        let url = format!("{}/v1/plans/{}", self.config.api_base_url, plan_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| DiscountError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DiscountError::plan_not_found(plan_id));
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe fetch plan failed");
            return Err(DiscountError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DiscountError::provider(format!("Failed to parse Stripe response: {}", e)))
    }

    /// Credit for one invoice, capped at one full billing period.
    fn credit_amount(&self, plan_amount: i64, referral_count: usize) -> i64 {
        let per_referral = plan_amount * i64::from(self.config.referral_discount_percent) / 100;
        (per_referral * referral_count as i64).min(plan_amount)
    }
}

#[async_trait]
impl DiscountApplier for StripeDiscountClient {
    async fn add_referral_discounts(
        &self,
        customer_id: &str,
        plan_id: &str,
        currency: &str,
        referrals: &[Referral],
    ) -> Result<(), DiscountError> {
        if referrals.is_empty() {
            tracing::debug!(customer_id, "no active referrals, nothing to credit");
            return Ok(());
        }

        let plan = self.fetch_plan(plan_id).await?;
        let credit = self.credit_amount(plan.amount.unwrap_or(0), referrals.len());
        if credit == 0 {
            return Ok(());
        }

        let url = format!("{}/v1/invoiceitems", self.config.api_base_url);
        let params: Vec<(&str, String)> = vec![
            ("customer", customer_id.to_string()),
            ("amount", (-credit).to_string()),
            ("currency", currency.to_string()),
            (
                "description",
                format!("Referral credit for {} active referral(s)", referrals.len()),
            ),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| DiscountError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe create invoiceitem failed");
            return Err(DiscountError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        tracing::info!(
            customer_id,
            plan_id,
            credit,
            referral_count = referrals.len(),
            "referral credit applied"
        );

        Ok(())
    }
}
