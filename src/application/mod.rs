//! Application layer - Command handlers and background services.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
pub mod retention;

pub use handlers::billing::ProcessWebhookHandler;
pub use retention::{RetentionConfig, RetentionSweeper};
