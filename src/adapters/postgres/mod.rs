//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserDirectory` - User and referral lookups with encrypted emails
//! - `PostgresWebhookLedger` - Processed-event ledger for webhook dedup

mod user_directory;
mod webhook_ledger;

pub use user_directory::PostgresUserDirectory;
pub use webhook_ledger::PostgresWebhookLedger;
