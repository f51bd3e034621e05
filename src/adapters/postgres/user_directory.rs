//! PostgreSQL implementation of UserDirectory.
//!
//! User emails are stored encrypted with pgcrypto; queries decrypt them
//! with the symmetric key from configuration.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use crate::ports::{Referral, UserDirectory, UserRecord, UserStoreError};

/// PostgreSQL implementation of the UserDirectory port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresUserDirectory {
    pool: PgPool,
    email_key: SecretString,
}

impl PostgresUserDirectory {
    /// Creates a new PostgresUserDirectory with the given connection pool
    /// and email decryption key.
    pub fn new(pool: PgPool, email_key: impl Into<String>) -> Self {
        Self {
            pool,
            email_key: SecretString::new(email_key.into()),
        }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    stripe_customer_id: Option<String>,
    referral_code: Option<String>,
    referred_by: Option<Uuid>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            customer_id: row.stripe_customer_id,
            referral_code: row.referral_code,
            referred_by: row.referred_by,
        }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, pgp_sym_decrypt(email_encrypted, $2) AS email,
                   stripe_customer_id, referral_code, referred_by
            FROM users
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .bind(self.email_key.expose_secret())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::Database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(UserRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, UserStoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, pgp_sym_decrypt(email_encrypted, $2) AS email,
                   stripe_customer_id, referral_code, referred_by
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(self.email_key.expose_secret())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserStoreError::Database(format!("Failed to find user: {}", e)))?;

        Ok(row.map(UserRecord::from))
    }

    async fn active_subscription_count(&self, user_id: Uuid) -> Result<u64, UserStoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM subscriptions
            WHERE user_id = $1 AND status IN ('active', 'trialing')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| UserStoreError::Database(format!("Failed to count subscriptions: {}", e)))?;

        Ok(count as u64)
    }

    async fn active_referrals(&self, user_id: Uuid) -> Result<Vec<Referral>, UserStoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT u.id
            FROM users u
            JOIN subscriptions s ON s.user_id = u.id
            WHERE u.referred_by = $1 AND s.status IN ('active', 'trialing')
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserStoreError::Database(format!("Failed to load referrals: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(user_id,)| Referral { user_id })
            .collect())
    }
}
