//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `UserDirectory` - User and referral lookups
//! - `Mailer` - Transactional billing emails
//! - `DiscountApplier` - Referral credits on invoices
//! - `WebhookLedger` - Stripe webhook idempotency tracking

mod discount_applier;
mod mailer;
mod user_directory;
mod webhook_ledger;

pub use discount_applier::{DiscountApplier, DiscountError, DiscountErrorCode};
pub use mailer::{EmailError, Mailer};
pub use user_directory::{Referral, UserDirectory, UserRecord, UserStoreError};
pub use webhook_ledger::{LedgerError, ProcessedEvent, SaveResult, WebhookLedger};
