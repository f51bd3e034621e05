//! Mailer port - Interface for transactional billing emails.
//!
//! Every notification the webhook handlers send goes through this port.
//! One method per message keeps templates and their inputs in the
//! adapter, not in the billing rules.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Could not reach the email provider.
    #[error("Email network error: {0}")]
    Network(String),

    /// Provider rejected the send.
    #[error("Email provider error: {0}")]
    Provider(String),
}

/// Port for sending transactional billing emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Trial ends in three days; remind the user to add a card.
    async fn send_trial_ending(&self, to: &str) -> Result<(), EmailError>;

    /// The card on file is about to expire.
    async fn send_card_expiring(&self, to: &str) -> Result<(), EmailError>;

    /// A payment attempt failed.
    async fn send_payment_failed(&self, to: &str) -> Result<(), EmailError>;

    /// First payment landed; invite the user to share their referral code.
    async fn send_referral_promo(&self, to: &str, referral_code: &str) -> Result<(), EmailError>;

    /// Someone this user referred converted to a paid subscription.
    async fn send_referral_subscription_started(
        &self,
        to: &str,
        referred_email: &str,
    ) -> Result<(), EmailError>;

    /// Someone this user referred started a trial.
    async fn send_referral_trial_started(
        &self,
        to: &str,
        referred_email: &str,
    ) -> Result<(), EmailError>;
}
