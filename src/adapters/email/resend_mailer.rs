//! Resend transactional email adapter.
//!
//! Implements the `Mailer` port against the Resend REST API. Each port
//! method maps to one transactional template rendered inline.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{EmailError, Mailer};

/// Base URL for the Resend API.
const RESEND_API_BASE_URL: &str = "https://api.resend.com";

/// Resend API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key (re_...).
    api_key: SecretString,

    /// From header, e.g. "Skylane <billing@skylane.app>".
    from_header: String,

    /// Base URL for the Resend API.
    api_base_url: String,
}

impl ResendConfig {
    /// Create a new Resend configuration.
    pub fn new(api_key: impl Into<String>, from_header: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            from_header: from_header.into(),
            api_base_url: RESEND_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Email send request in Resend's format.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Resend-backed mailer.
pub struct ResendMailer {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendMailer {
    /// Create a new mailer with the given configuration.
    pub fn new(config: ResendConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let url = format!("{}/emails", self.config.api_base_url);
        let request = SendEmailRequest {
            from: &self.config.from_header,
            to: [to],
            subject,
            html,
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Failed to send email");
            return Err(EmailError::Provider(format!("{}: {}", status, error_text)));
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_trial_ending(&self, to: &str) -> Result<(), EmailError> {
        self.send(
            to,
            "Your Skylane trial ends in 3 days",
            "<p>Your Skylane trial ends in 3 days, and your card will be charged \
             when it converts. You can cancel any time from your account page.</p>",
        )
        .await
    }

    async fn send_card_expiring(&self, to: &str) -> Result<(), EmailError> {
        self.send(
            to,
            "The card on your Skylane account is expiring",
            "<p>The card on your Skylane account is about to expire. Update it in \
             your account settings to avoid any interruption to your service.</p>",
        )
        .await
    }

    async fn send_payment_failed(&self, to: &str) -> Result<(), EmailError> {
        self.send(
            to,
            "We could not process your Skylane payment",
            "<p>We could not process your latest Skylane payment. Please check \
             your card details; we will retry over the next few days.</p>",
        )
        .await
    }

    async fn send_referral_promo(&self, to: &str, referral_code: &str) -> Result<(), EmailError> {
        let html = format!(
            "<p>Thanks for subscribing to Skylane. Share your referral code \
             <strong>{}</strong> with friends: they get a discount, and you earn \
             credit on your invoices while they stay subscribed.</p>",
            referral_code
        );
        self.send(to, "Share Skylane and earn free months", &html).await
    }

    async fn send_referral_subscription_started(
        &self,
        to: &str,
        referred_email: &str,
    ) -> Result<(), EmailError> {
        let html = format!(
            "<p>{} just subscribed to Skylane with your referral code. Your \
             credit will appear on your next invoice.</p>",
            referred_email
        );
        self.send(to, "Your referral just subscribed", &html).await
    }

    async fn send_referral_trial_started(
        &self,
        to: &str,
        referred_email: &str,
    ) -> Result<(), EmailError> {
        let html = format!(
            "<p>{} just started a Skylane trial with your referral code. You \
             earn a credit once they subscribe.</p>",
            referred_email
        );
        self.send(to, "Your referral started a trial", &html).await
    }
}
