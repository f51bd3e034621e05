//! RetentionSweeper - Background service that prunes the webhook ledger.
//!
//! Processed-event records only need to live long enough to absorb
//! Stripe's redelivery window; after that they are dead weight. This
//! service wakes up on an interval and deletes records older than the
//! configured retention period.
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and exits between sweeps.
//! A failed sweep is logged and retried on the next tick, so a database
//! hiccup never kills the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;

use crate::ports::{LedgerError, WebhookLedger};

/// Configuration for the RetentionSweeper service.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// How often to run a sweep.
    pub sweep_interval: Duration,

    /// How many days of processed events to keep.
    pub retention_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60 * 60 * 24),
            retention_days: 30,
        }
    }
}

impl RetentionConfig {
    /// Create config with a custom sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Create config with a custom retention period.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}

/// Background service that deletes old processed-event records.
pub struct RetentionSweeper {
    ledger: Arc<dyn WebhookLedger>,
    config: RetentionConfig,
}

impl RetentionSweeper {
    /// Create a new RetentionSweeper with default configuration.
    pub fn new(ledger: Arc<dyn WebhookLedger>) -> Self {
        Self {
            ledger,
            config: RetentionConfig::default(),
        }
    }

    /// Create a new RetentionSweeper with custom configuration.
    pub fn with_config(ledger: Arc<dyn WebhookLedger>, config: RetentionConfig) -> Self {
        Self { ledger, config }
    }

    /// Run the sweep loop until shutdown signal is received.
    ///
    /// The first sweep runs immediately on startup, subsequent sweeps
    /// follow the configured interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::debug!("retention sweeper shutting down");
                        return;
                    }
                }

                _ = interval.tick() => {
                    // A failed sweep is retried on the next tick
                    if let Err(e) = self.sweep_once().await {
                        tracing::warn!(error = %e, "ledger retention sweep failed");
                    }
                }
            }
        }
    }

    /// Run exactly one sweep, deleting records past the retention cutoff.
    ///
    /// Returns the number of records deleted. Also useful for testing
    /// without running the full loop.
    pub async fn sweep_once(&self) -> Result<u64, LedgerError> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(self.config.retention_days));
        let deleted = self.ledger.delete_before(cutoff).await?;

        if deleted > 0 {
            tracing::info!(deleted, "pruned old processed webhook events");
        }

        Ok(deleted)
    }
}
