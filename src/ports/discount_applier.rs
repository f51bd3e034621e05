//! DiscountApplier port - Interface for posting referral credits.
//!
//! When a referrer's invoice is created, credits for their active
//! referrals are attached to it before Stripe finalizes the charge.

use async_trait::async_trait;

use super::user_directory::Referral;

/// Error category for a failed discount application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountErrorCode {
    /// Could not reach the billing provider.
    NetworkError,
    /// Provider rejected the request.
    ProviderError,
    /// The plan on the invoice line does not exist.
    PlanNotFound,
}

impl DiscountErrorCode {
    /// Whether a retry of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DiscountErrorCode::NetworkError)
    }
}

/// A failed attempt to apply referral credits.
#[derive(Debug, Clone)]
pub struct DiscountError {
    /// What went wrong.
    pub code: DiscountErrorCode,
    /// Provider or transport detail.
    pub message: String,
    /// Whether a retry of the same request could succeed.
    pub retryable: bool,
}

impl DiscountError {
    pub fn new(code: DiscountErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DiscountErrorCode::NetworkError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(DiscountErrorCode::ProviderError, message)
    }

    pub fn plan_not_found(plan_id: &str) -> Self {
        Self::new(
            DiscountErrorCode::PlanNotFound,
            format!("Plan not found: {}", plan_id),
        )
    }
}

impl std::fmt::Display for DiscountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for DiscountError {}

/// Port for applying referral credits to a customer's invoice.
#[async_trait]
pub trait DiscountApplier: Send + Sync {
    /// Attach referral credits for the given active referrals to the
    /// customer's open invoice.
    async fn add_referral_discounts(
        &self,
        customer_id: &str,
        plan_id: &str,
        currency: &str,
        referrals: &[Referral],
    ) -> Result<(), DiscountError>;
}
