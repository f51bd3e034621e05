//! ProcessWebhookHandler - Dispatches acknowledged Stripe events to billing rules.

use std::sync::Arc;

use crate::domain::billing::{
    DispatchOutcome, ProcessOutcome, StripeEvent, StripeEventType, StripeInvoice, StripeSource,
    StripeSubscription, WebhookError,
};
use crate::ports::{
    DiscountApplier, Mailer, ProcessedEvent, SaveResult, UserDirectory, UserRecord, WebhookLedger,
};

/// Handler for verified webhook events.
///
/// Runs after the HTTP layer has already acknowledged the event, so
/// nothing here can change Stripe's view of the delivery. Failures are
/// logged and recorded in the event ledger instead of being returned.
pub struct ProcessWebhookHandler {
    users: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
    discounts: Arc<dyn DiscountApplier>,
    ledger: Arc<dyn WebhookLedger>,
}

impl ProcessWebhookHandler {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
        discounts: Arc<dyn DiscountApplier>,
        ledger: Arc<dyn WebhookLedger>,
    ) -> Self {
        Self {
            users,
            mailer,
            discounts,
            ledger,
        }
    }

    /// Run the full pipeline for a delivered event.
    ///
    /// 1. Skip the event if the ledger has already seen its ID
    /// 2. Route to the handler for its type
    /// 3. Record the outcome for dedup and auditing
    ///
    /// The ledger is advisory on both ends: a failed lookup dispatches
    /// anyway, and a failed record keeps the dispatch outcome.
    pub async fn process(&self, event: StripeEvent) -> ProcessOutcome {
        // 1. Duplicate check
        match self.ledger.find_by_event_id(&event.id).await {
            Ok(Some(_)) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "duplicate delivery skipped"
                );
                return ProcessOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(e) => {
                // A broken ledger must not stop event handling
                tracing::warn!(
                    event_id = %event.id,
                    error = %e,
                    "ledger lookup failed, dispatching anyway"
                );
            }
        }

        // 2. Dispatch
        let outcome = self.dispatch(&event).await;

        // 3. Record the outcome
        let record = match &outcome {
            DispatchOutcome::Success => {
                ProcessedEvent::success(event.id.as_str(), event.event_type.as_str())
            }
            DispatchOutcome::Recovered(err) => ProcessedEvent::recovered(
                event.id.as_str(),
                event.event_type.as_str(),
                err.to_string(),
            ),
        };
        match self.ledger.record(record).await {
            Ok(SaveResult::Inserted) => {}
            Ok(SaveResult::AlreadyExists) => {
                tracing::info!(
                    event_id = %event.id,
                    "concurrent delivery recorded this event first"
                );
            }
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    error = %e,
                    "failed to record processed event"
                );
            }
        }

        outcome.report(&event.id, &event.event_type);
        ProcessOutcome::Completed(outcome)
    }

    /// Route the event to the handler for its type.
    async fn dispatch(&self, event: &StripeEvent) -> DispatchOutcome {
        let result = match event.parsed_type() {
            StripeEventType::TrialWillEnd => self.on_trial_will_end(event).await,
            StripeEventType::SourceExpiring => self.on_source_expiring(event).await,
            StripeEventType::InvoiceCreated => self.on_invoice_created(event).await,
            StripeEventType::InvoicePaymentFailed => self.on_payment_failed(event).await,
            StripeEventType::InvoicePaymentSucceeded => self.on_payment_succeeded(event).await,
            StripeEventType::Unknown(raw) => Err(WebhookError::UnknownEventType(raw)),
        };

        match result {
            Ok(()) => DispatchOutcome::Success,
            Err(err) => DispatchOutcome::Recovered(err),
        }
    }

    async fn user_by_customer_id(&self, customer_id: &str) -> Result<UserRecord, WebhookError> {
        self.users
            .find_by_customer_id(customer_id)
            .await
            .map_err(|e| WebhookError::UserLookup(e.to_string()))?
            .ok_or_else(|| {
                WebhookError::UserLookup(format!("no user for customer {}", customer_id))
            })
    }

    /// `customer.subscription.trial_will_end`
    ///
    /// Sent three days before a trial converts. Users who already
    /// canceled get no reminder.
    async fn on_trial_will_end(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: StripeSubscription = event.deserialize_object()?;

        if subscription.canceled_at.is_some() {
            tracing::debug!(
                event_id = %event.id,
                customer_id = %subscription.customer,
                "subscription already canceled, no reminder"
            );
            return Ok(());
        }

        let user = self.user_by_customer_id(&subscription.customer).await?;
        self.mailer
            .send_trial_ending(&user.email)
            .await
            .map_err(|e| WebhookError::Notification(e.to_string()))
    }

    /// `customer.source.expiring`
    ///
    /// Only worth a notice while the user has something billing against
    /// the card.
    async fn on_source_expiring(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let source: StripeSource = event.deserialize_object()?;
        let user = self.user_by_customer_id(&source.customer).await?;

        let active = self
            .users
            .active_subscription_count(user.id)
            .await
            .map_err(|e| WebhookError::UserLookup(e.to_string()))?;
        if active == 0 {
            tracing::debug!(
                event_id = %event.id,
                user_id = %user.id,
                "no active subscriptions, expiry notice skipped"
            );
            return Ok(());
        }

        self.mailer
            .send_card_expiring(&user.email)
            .await
            .map_err(|e| WebhookError::Notification(e.to_string()))
    }

    /// `invoice.created`
    ///
    /// Stripe leaves new invoices in draft for about an hour. Referral
    /// credits have to land in that window, before finalization.
    async fn on_invoice_created(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: StripeInvoice = event.deserialize_object()?;

        if invoice.paid {
            tracing::debug!(
                event_id = %event.id,
                customer_id = %invoice.customer,
                "invoice already paid, no credits to attach"
            );
            return Ok(());
        }

        let line = invoice
            .subscription_line_item()
            .ok_or(WebhookError::MissingSubscriptionLineItem)?;
        let plan = line.plan.as_ref().ok_or_else(|| {
            WebhookError::ParseError("subscription line item has no plan".to_string())
        })?;

        let user = self.user_by_customer_id(&invoice.customer).await?;
        let referrals = self
            .users
            .active_referrals(user.id)
            .await
            .map_err(|e| WebhookError::UserLookup(e.to_string()))?;

        self.discounts
            .add_referral_discounts(&invoice.customer, &plan.id, &line.currency, &referrals)
            .await
            .map_err(|e| WebhookError::Discount(e.to_string()))
    }

    /// `invoice.payment_failed`
    async fn on_payment_failed(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: StripeInvoice = event.deserialize_object()?;
        let user = self.user_by_customer_id(&invoice.customer).await?;
        self.mailer
            .send_payment_failed(&user.email)
            .await
            .map_err(|e| WebhookError::Notification(e.to_string()))
    }

    /// `invoice.payment_succeeded`
    ///
    /// Two independent legs. On the first real payment the payer gets a
    /// referral promo (best effort). If the payer was referred, their
    /// referrer hears about the conversion or the trial start.
    async fn on_payment_succeeded(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: StripeInvoice = event.deserialize_object()?;
        let line = invoice
            .subscription_line_item()
            .ok_or(WebhookError::MissingSubscriptionLineItem)?;

        let payer = self.user_by_customer_id(&invoice.customer).await?;
        let first_payment = invoice.is_first_payment(line);

        if first_payment {
            match payer.referral_code.as_deref() {
                Some(code) => {
                    // Best effort: a failed promo must not block the referrer leg
                    if let Err(e) = self.mailer.send_referral_promo(&payer.email, code).await {
                        tracing::warn!(
                            event_id = %event.id,
                            user_id = %payer.id,
                            error = %e,
                            "referral promo email failed"
                        );
                    }
                }
                None => {
                    tracing::debug!(
                        event_id = %event.id,
                        user_id = %payer.id,
                        "payer has no referral code, promo skipped"
                    );
                }
            }
        }

        let Some(referrer_id) = payer.referred_by else {
            return Ok(());
        };

        let referrer = self
            .users
            .find_by_id(referrer_id)
            .await
            .map_err(|e| WebhookError::UserLookup(e.to_string()))?
            .ok_or_else(|| {
                WebhookError::UserLookup(format!("no user with id {}", referrer_id))
            })?;

        if first_payment {
            self.mailer
                .send_referral_subscription_started(&referrer.email, &payer.email)
                .await
                .map_err(|e| WebhookError::Notification(e.to_string()))
        } else if invoice.is_trial_start(line) {
            self.mailer
                .send_referral_trial_started(&referrer.email, &payer.email)
                .await
                .map_err(|e| WebhookError::Notification(e.to_string()))
        } else {
            Ok(())
        }
    }
}
