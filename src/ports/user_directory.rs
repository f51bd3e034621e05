//! UserDirectory port - Interface for resolving users and referral links.
//!
//! Webhook handlers only ever see Stripe customer IDs. This port maps
//! them back to local accounts and answers the referral questions the
//! billing rules depend on.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors from user lookups.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

/// A user account as the billing rules see it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Local account ID.
    pub id: Uuid,

    /// Email address notifications go to.
    pub email: String,

    /// Stripe customer ID, once the user has billing history.
    pub customer_id: Option<String>,

    /// Code this user shares to refer others.
    pub referral_code: Option<String>,

    /// Account that referred this user, if any.
    pub referred_by: Option<Uuid>,
}

/// A user referred by someone, holding an active subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Referral {
    /// The referred user's account ID.
    pub user_id: Uuid,
}

/// Port for user and referral lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a Stripe customer ID to a local account.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserRecord>, UserStoreError>;

    /// Look up an account by its local ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, UserStoreError>;

    /// Count the user's active or trialing subscriptions.
    async fn active_subscription_count(&self, user_id: Uuid) -> Result<u64, UserStoreError>;

    /// List users this account referred who hold an active subscription.
    async fn active_referrals(&self, user_id: Uuid) -> Result<Vec<Referral>, UserStoreError>;
}
