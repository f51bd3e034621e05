//! Skylane webhook server binary.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use skylane_webhooks::adapters::email::{ResendConfig, ResendMailer};
use skylane_webhooks::adapters::http::{app, BillingAppState};
use skylane_webhooks::adapters::postgres::{PostgresUserDirectory, PostgresWebhookLedger};
use skylane_webhooks::adapters::stripe::{StripeClientConfig, StripeDiscountClient};
use skylane_webhooks::application::{RetentionConfig, RetentionSweeper};
use skylane_webhooks::config::AppConfig;
use skylane_webhooks::domain::billing::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load and validate configuration
    let config = AppConfig::load()?;
    config.validate()?;

    // Initialize tracing; RUST_LOG wins over the configured filter
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));
    let fmt_layer = if config.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();

    // Connect to PostgreSQL
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Wire adapters into the application state
    let users = Arc::new(PostgresUserDirectory::new(
        pool.clone(),
        config.database.email_encryption_key.clone(),
    ));
    let mailer = Arc::new(ResendMailer::new(ResendConfig::new(
        config.email.resend_api_key.clone(),
        config.email.from_header(),
    )));
    let discounts = Arc::new(StripeDiscountClient::new(
        StripeClientConfig::new(
            config.stripe.api_key.clone(),
            config.stripe.referral_discount_percent,
        )
        .with_base_url(config.stripe.api_base_url.clone()),
    ));
    let ledger = Arc::new(PostgresWebhookLedger::new(pool.clone()));
    let verifier = Arc::new(StripeWebhookVerifier::new(
        config.stripe.webhook_secret.clone(),
    ));

    let state = BillingAppState {
        verifier,
        users,
        mailer,
        discounts,
        ledger: ledger.clone(),
        domain: config.server.domain.clone(),
    };

    // Start the ledger retention sweeper
    let retention = RetentionSweeper::with_config(
        ledger,
        RetentionConfig::default().with_retention_days(config.stripe.event_retention_days),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_handle = tokio::spawn(async move {
        retention.run(shutdown_rx).await;
    });

    // Serve until a shutdown signal arrives
    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Skylane webhook server listening"
    );

    axum::serve(
        listener,
        app(
            state,
            Duration::from_secs(config.server.request_timeout_secs),
        ),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop the retention sweeper once the server has drained
    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received terminate signal, starting graceful shutdown");
        },
    }
}
