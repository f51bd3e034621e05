//! Integration tests for the webhook receive-verify-dispatch flow.
//!
//! These tests drive the full HTTP stack end to end:
//! 1. A signed Stripe event arrives at POST /stripe
//! 2. The signature is verified against the raw request bytes
//! 3. The event is acknowledged immediately with its event ID
//! 4. Billing rules run after the ack and land in the event ledger
//!
//! Uses in-memory implementations to test the flow without external dependencies.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;

use skylane_webhooks::adapters::http::{app, BillingAppState};
use skylane_webhooks::domain::billing::StripeWebhookVerifier;
use skylane_webhooks::ports::{
    DiscountApplier, DiscountError, EmailError, LedgerError, Mailer, ProcessedEvent, Referral,
    SaveResult, UserDirectory, UserRecord, UserStoreError, WebhookLedger,
};

const TEST_SECRET: &str = "whsec_integration_test";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn payer_id() -> Uuid {
    Uuid::from_u128(1)
}

fn referrer_id() -> Uuid {
    Uuid::from_u128(2)
}

/// In-memory user directory seeded with a payer referred by a referrer
struct InMemoryUsers {
    users: Vec<UserRecord>,
    referrals: Vec<Referral>,
}

impl InMemoryUsers {
    fn seeded() -> Self {
        Self {
            users: vec![
                UserRecord {
                    id: payer_id(),
                    email: "alice@example.com".to_string(),
                    customer_id: Some("cus_alice".to_string()),
                    referral_code: Some("ALICE10".to_string()),
                    referred_by: Some(referrer_id()),
                },
                UserRecord {
                    id: referrer_id(),
                    email: "referrer@example.com".to_string(),
                    customer_id: Some("cus_bob".to_string()),
                    referral_code: Some("BOB20".to_string()),
                    referred_by: None,
                },
            ],
            referrals: vec![
                Referral {
                    user_id: payer_id(),
                },
                Referral {
                    user_id: Uuid::from_u128(3),
                },
            ],
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn active_subscription_count(&self, _user_id: Uuid) -> Result<u64, UserStoreError> {
        Ok(1)
    }

    async fn active_referrals(&self, _user_id: Uuid) -> Result<Vec<Referral>, UserStoreError> {
        Ok(self.referrals.clone())
    }
}

/// Mailer that records each send as "kind:recipient"
struct InMemoryMailer {
    sent: Mutex<Vec<String>>,
}

impl InMemoryMailer {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.sent.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send_trial_ending(&self, to: &str) -> Result<(), EmailError> {
        self.record(format!("trial_ending:{}", to));
        Ok(())
    }

    async fn send_card_expiring(&self, to: &str) -> Result<(), EmailError> {
        self.record(format!("card_expiring:{}", to));
        Ok(())
    }

    async fn send_payment_failed(&self, to: &str) -> Result<(), EmailError> {
        self.record(format!("payment_failed:{}", to));
        Ok(())
    }

    async fn send_referral_promo(&self, to: &str, _referral_code: &str) -> Result<(), EmailError> {
        self.record(format!("referral_promo:{}", to));
        Ok(())
    }

    async fn send_referral_subscription_started(
        &self,
        to: &str,
        _referred_email: &str,
    ) -> Result<(), EmailError> {
        self.record(format!("referral_subscribed:{}", to));
        Ok(())
    }

    async fn send_referral_trial_started(
        &self,
        to: &str,
        _referred_email: &str,
    ) -> Result<(), EmailError> {
        self.record(format!("referral_trial:{}", to));
        Ok(())
    }
}

/// Discount applier that records each call
struct InMemoryDiscounts {
    calls: Mutex<Vec<(String, String, usize)>>,
}

impl InMemoryDiscounts {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiscountApplier for InMemoryDiscounts {
    async fn add_referral_discounts(
        &self,
        customer_id: &str,
        plan_id: &str,
        _currency: &str,
        referrals: &[Referral],
    ) -> Result<(), DiscountError> {
        self.calls.lock().unwrap().push((
            customer_id.to_string(),
            plan_id.to_string(),
            referrals.len(),
        ));
        Ok(())
    }
}

/// In-memory processed-event ledger
struct InMemoryLedger {
    records: Mutex<HashMap<String, ProcessedEvent>>,
}

impl InMemoryLedger {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn recorded(&self, event_id: &str) -> Option<ProcessedEvent> {
        self.records.lock().unwrap().get(event_id).cloned()
    }
}

#[async_trait]
impl WebhookLedger for InMemoryLedger {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, LedgerError> {
        Ok(self.records.lock().unwrap().get(event_id).cloned())
    }

    async fn record(&self, event: ProcessedEvent) -> Result<SaveResult, LedgerError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&event.event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(event.event_id.clone(), event);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, LedgerError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.processed_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

struct TestEnv {
    router: Router,
    mailer: Arc<InMemoryMailer>,
    discounts: Arc<InMemoryDiscounts>,
    ledger: Arc<InMemoryLedger>,
}

fn test_env() -> TestEnv {
    let mailer = Arc::new(InMemoryMailer::new());
    let discounts = Arc::new(InMemoryDiscounts::new());
    let ledger = Arc::new(InMemoryLedger::new());

    let state = BillingAppState {
        verifier: Arc::new(StripeWebhookVerifier::new(TEST_SECRET)),
        users: Arc::new(InMemoryUsers::seeded()),
        mailer: mailer.clone(),
        discounts: discounts.clone(),
        ledger: ledger.clone(),
        domain: "skylane.test".to_string(),
    };

    TestEnv {
        router: app(state, Duration::from_secs(5)),
        mailer,
        discounts,
        ledger,
    }
}

fn sign(timestamp: i64, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).expect("HMAC accepts any key");
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn event_payload(event_id: &str, event_type: &str, object: serde_json::Value) -> String {
    json!({
        "id": event_id,
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": object },
        "livemode": false,
        "api_version": "2023-10-16"
    })
    .to_string()
}

fn first_payment_invoice(customer: &str) -> serde_json::Value {
    json!({
        "customer": customer,
        "paid": true,
        "amount_due": 2000,
        "amount_paid": 2000,
        "amount_remaining": 0,
        "number": "SKY1234-0002",
        "lines": {
            "data": [
                {
                    "type": "subscription",
                    "amount": 2000,
                    "currency": "usd",
                    "plan": { "id": "plan_monthly" }
                }
            ]
        }
    })
}

fn draft_invoice(customer: &str) -> serde_json::Value {
    json!({
        "customer": customer,
        "paid": false,
        "amount_due": 2000,
        "amount_paid": 0,
        "amount_remaining": 2000,
        "number": "SKY1234-0005",
        "lines": {
            "data": [
                {
                    "type": "subscription",
                    "amount": 2000,
                    "currency": "usd",
                    "plan": { "id": "plan_monthly" }
                }
            ]
        }
    })
}

fn signed_request(payload: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = format!("t={},v1={}", timestamp, sign(timestamp, payload));
    Request::builder()
        .method("POST")
        .uri("/stripe")
        .header("Stripe-Signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met while waiting for background processing");
}

// =============================================================================
// Integration Tests
// =============================================================================

/// A correctly signed event is acknowledged with its event ID and the
/// matching billing rule runs after the response.
#[tokio::test]
async fn signed_event_is_acknowledged_then_processed() {
    let env = test_env();
    let payload = event_payload(
        "evt_flow_1",
        "customer.subscription.trial_will_end",
        json!({ "customer": "cus_alice", "canceled_at": null }),
    );

    let (status, body) = send(&env.router, signed_request(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Signed Webhook Received: evt_flow_1");

    let mailer = env.mailer.clone();
    wait_until(move || !mailer.sent().is_empty()).await;
    assert_eq!(
        env.mailer.sent(),
        vec!["trial_ending:alice@example.com".to_string()]
    );

    let ledger = env.ledger.clone();
    wait_until(move || ledger.recorded("evt_flow_1").is_some()).await;
    assert_eq!(env.ledger.recorded("evt_flow_1").unwrap().outcome, "success");
}

/// A tampered body fails verification before any side effect runs.
#[tokio::test]
async fn tampered_body_is_rejected_before_any_side_effect() {
    let env = test_env();
    let payload = event_payload(
        "evt_tampered",
        "customer.subscription.trial_will_end",
        json!({ "customer": "cus_alice", "canceled_at": null }),
    );

    let timestamp = chrono::Utc::now().timestamp();
    let signature = format!("t={},v1={}", timestamp, sign(timestamp, &payload));
    let tampered = payload.replace("cus_alice", "cus_evil");
    let request = Request::builder()
        .method("POST")
        .uri("/stripe")
        .header("Stripe-Signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(tampered))
        .unwrap();

    let (status, body) = send(&env.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("INVALID_WEBHOOK_SIGNATURE"));

    // Give any stray background work a chance to run before asserting
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(env.mailer.sent().is_empty());
    assert!(env.ledger.recorded("evt_tampered").is_none());
}

/// A request without a signature header is rejected as malformed.
#[tokio::test]
async fn unsigned_request_is_rejected() {
    let env = test_env();
    let payload = event_payload(
        "evt_unsigned",
        "invoice.created",
        json!({ "customer": "cus_alice" }),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/stripe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload))
        .unwrap();

    let (status, body) = send(&env.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("MISSING_SIGNATURE_HEADER"));
}

/// Stripe redelivers; the second delivery is acknowledged but the
/// billing rule only runs once.
#[tokio::test]
async fn duplicate_delivery_dispatches_once() {
    let env = test_env();
    let payload = event_payload(
        "evt_redelivered",
        "customer.subscription.trial_will_end",
        json!({ "customer": "cus_alice", "canceled_at": null }),
    );

    let (first_status, _) = send(&env.router, signed_request(&payload)).await;
    assert_eq!(first_status, StatusCode::OK);

    let ledger = env.ledger.clone();
    wait_until(move || ledger.recorded("evt_redelivered").is_some()).await;

    let (second_status, second_body) = send(&env.router, signed_request(&payload)).await;
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second_body, "Signed Webhook Received: evt_redelivered");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(env.mailer.sent().len(), 1);
}

/// A first payment thanks the payer with their promo code and notifies
/// the referrer who brought them in.
#[tokio::test]
async fn first_payment_notifies_payer_and_referrer() {
    let env = test_env();
    let payload = event_payload(
        "evt_first_payment",
        "invoice.payment_succeeded",
        first_payment_invoice("cus_alice"),
    );

    let (status, _) = send(&env.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let mailer = env.mailer.clone();
    wait_until(move || mailer.sent().len() == 2).await;

    let sent = env.mailer.sent();
    assert!(sent.contains(&"referral_promo:alice@example.com".to_string()));
    assert!(sent.contains(&"referral_subscribed:referrer@example.com".to_string()));
}

/// Referral credits land on the draft invoice before Stripe finalizes it.
#[tokio::test]
async fn draft_invoice_gets_referral_credits() {
    let env = test_env();
    let payload = event_payload(
        "evt_draft_invoice",
        "invoice.created",
        draft_invoice("cus_bob"),
    );

    let (status, _) = send(&env.router, signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let discounts = env.discounts.clone();
    wait_until(move || !discounts.calls().is_empty()).await;

    let calls = env.discounts.calls();
    assert_eq!(
        calls,
        vec![("cus_bob".to_string(), "plan_monthly".to_string(), 2)]
    );
}

/// Events without a handler are still acknowledged and show up in the
/// ledger as recovered.
#[tokio::test]
async fn unknown_event_is_acknowledged_and_recorded() {
    let env = test_env();
    let payload = event_payload("evt_unknown", "charge.dispute.created", json!({}));

    let (status, body) = send(&env.router, signed_request(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Signed Webhook Received: evt_unknown");

    let ledger = env.ledger.clone();
    wait_until(move || ledger.recorded("evt_unknown").is_some()).await;

    let record = env.ledger.recorded("evt_unknown").unwrap();
    assert_eq!(record.outcome, "recovered");
    assert!(record
        .error_message
        .unwrap()
        .contains("charge.dispute.created"));
}

/// The health endpoint reports the serving domain.
#[tokio::test]
async fn health_reports_serving_domain() {
    let env = test_env();
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&env.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("OK from skylane.test"));
}
