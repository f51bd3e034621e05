//! Email adapters.
//!
//! - `ResendMailer` - Transactional email via the Resend REST API

mod resend_mailer;

pub use resend_mailer::{ResendConfig, ResendMailer};
