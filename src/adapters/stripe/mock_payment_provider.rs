//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured checkout sessions and webhook events
//! - Error injection
//! - Call tracking
//! - Parsing unsigned Stripe-shaped payloads into events

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    CheckoutCompleted, CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentProvider,
    WebhookEvent, WebhookEventData, WebhookEventType,
};

use super::webhook_types::{StripeCheckoutSession, StripePaymentIntent, StripeWebhookEvent};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.set_webhook_event(MockPaymentProvider::checkout_completed_event("evt_1", 800));
///
/// let event = mock.verify_webhook(b"{}", "t=1,v1=00").await?;
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Next checkout session to return.
    next_checkout: Option<CheckoutSession>,

    /// Webhook event to return on every verification.
    webhook_event: Option<WebhookEvent>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Every checkout request received.
    checkout_requests: Vec<CreateCheckoutRequest>,

    call_log: Vec<MethodCall>,

    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Accept any signature.
    #[default]
    AcceptAll,

    /// Always fail verification.
    AlwaysFail,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the checkout session to return on the next `create_checkout_session`.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.state().next_checkout = Some(session);
    }

    /// Set the webhook event to return on verification.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.state().webhook_event = Some(event);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Checkout requests received so far, oldest first.
    pub fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().checkout_requests.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        // Method-specific errors stick; the global one is consumed
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    /// Builds an event from a Stripe-shaped JSON payload without checking signatures.
    fn parse_unsigned(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let raw: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e)))?;

        let event_type = WebhookEventType::from_provider(&raw.event_type);
        let data = match &event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(raw.data.object.clone())
                        .map_err(|e| PaymentError::invalid_webhook(e.to_string()))?;
                WebhookEventData::Checkout(CheckoutCompleted {
                    customer_email: session.payer_email().map(str::to_string),
                    customer_name: session.payer_name().map(str::to_string),
                    session_id: session.id,
                    amount_total: session.amount_total,
                    currency: session.currency,
                    payment_status: session.payment_status,
                })
            }
            WebhookEventType::PaymentIntentFailed => {
                let intent: StripePaymentIntent = serde_json::from_value(raw.data.object.clone())
                    .map_err(|e| PaymentError::invalid_webhook(e.to_string()))?;
                WebhookEventData::PaymentFailed {
                    payment_intent_id: intent.id,
                    failure_message: intent.last_payment_error.and_then(|e| e.message),
                }
            }
            WebhookEventType::Unknown(_) => WebhookEventData::Raw {
                json: raw.data.object.to_string(),
            },
        };

        Ok(WebhookEvent {
            id: raw.id,
            event_type,
            data,
            created_at: raw.created,
            livemode: raw.livemode,
        })
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call(
            "create_checkout_session",
            vec![request.unit_amount.to_string(), request.currency.clone()],
        );
        self.check_error("create_checkout_session")?;

        let mut state = self.state();
        state.checkout_requests.push(request);

        let session = state.next_checkout.take().unwrap_or_else(|| {
            let id = format!("cs_mock_{}", uuid::Uuid::new_v4().simple());
            CheckoutSession {
                url: format!("https://checkout.stripe.com/c/pay/{}", id),
                id,
                expires_at: Some(chrono::Utc::now().timestamp() + 24 * 60 * 60),
            }
        });

        Ok(session)
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.record_call(
            "verify_webhook",
            vec![
                String::from_utf8_lossy(payload).chars().take(50).collect(),
                signature.chars().take(20).collect(),
            ],
        );
        self.check_error("verify_webhook")?;

        let configured = {
            let state = self.state();
            if let WebhookVerifyMode::AlwaysFail = state.webhook_verify_mode {
                return Err(PaymentError::invalid_webhook("Invalid signature"));
            }
            state.webhook_event.clone()
        };

        match configured {
            Some(event) => Ok(event),
            None => Self::parse_unsigned(payload),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockPaymentProvider {
    /// A completed checkout event for `amount_total` minor units.
    pub fn checkout_completed_event(event_id: &str, amount_total: i64) -> WebhookEvent {
        Self::checkout_event_with(
            event_id,
            CheckoutCompleted {
                session_id: format!("cs_{}", uuid::Uuid::new_v4().simple()),
                amount_total: Some(amount_total),
                currency: Some("usd".to_string()),
                customer_email: Some("supporter@example.com".to_string()),
                customer_name: Some("Grace Hopper".to_string()),
                payment_status: Some("paid".to_string()),
            },
        )
    }

    /// A completed checkout event with explicit session facts.
    pub fn checkout_event_with(event_id: &str, checkout: CheckoutCompleted) -> WebhookEvent {
        WebhookEvent {
            id: event_id.to_string(),
            event_type: WebhookEventType::CheckoutSessionCompleted,
            data: WebhookEventData::Checkout(checkout),
            created_at: chrono::Utc::now().timestamp(),
            livemode: false,
        }
    }

    pub fn payment_failed_event(event_id: &str) -> WebhookEvent {
        WebhookEvent {
            id: event_id.to_string(),
            event_type: WebhookEventType::PaymentIntentFailed,
            data: WebhookEventData::PaymentFailed {
                payment_intent_id: format!("pi_{}", uuid::Uuid::new_v4().simple()),
                failure_message: Some("Your card was declined.".to_string()),
            },
            created_at: chrono::Utc::now().timestamp(),
            livemode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PaymentErrorCode;
    use std::collections::BTreeMap;

    fn request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            unit_amount: 500,
            currency: "usd".to_string(),
            product_name: "Buy Me a Coffee".to_string(),
            product_description: None,
            success_url: "https://example.com?success=true".to_string(),
            cancel_url: "https://example.com?canceled=true".to_string(),
            metadata: BTreeMap::new(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_checkout_session_returns_generated_session() {
        let mock = MockPaymentProvider::new();

        let session = mock.create_checkout_session(request()).await.unwrap();

        assert!(session.id.starts_with("cs_mock_"));
        assert!(session.url.ends_with(&session.id));
        assert_eq!(mock.checkout_requests()[0].unit_amount, 500);
    }

    #[tokio::test]
    async fn set_checkout_session_returns_configured() {
        let mock = MockPaymentProvider::new();
        mock.set_checkout_session(CheckoutSession {
            id: "cs_fixed".to_string(),
            url: "https://checkout.stripe.com/c/pay/cs_fixed".to_string(),
            expires_at: None,
        });

        let session = mock.create_checkout_session(request()).await.unwrap();

        assert_eq!(session.id, "cs_fixed");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Injection
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn set_error_is_consumed_once() {
        let mock = MockPaymentProvider::new();
        mock.set_error(PaymentError::network("Connection refused"));

        let first = mock.create_checkout_session(request()).await;
        let second = mock.create_checkout_session(request()).await;

        assert_eq!(first.unwrap_err().code, PaymentErrorCode::NetworkError);
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn method_error_persists_until_cleared() {
        let mock = MockPaymentProvider::new();
        mock.set_method_error("create_checkout_session", PaymentError::provider("down"));

        assert!(mock.create_checkout_session(request()).await.is_err());
        assert!(mock.create_checkout_session(request()).await.is_err());

        mock.clear_errors();
        assert!(mock.create_checkout_session(request()).await.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhooks
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn rejecting_webhooks_fails_verification() {
        let mock = MockPaymentProvider::rejecting_webhooks();

        let err = mock.verify_webhook(b"{}", "t=1,v1=00").await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn configured_event_is_returned() {
        let mock = MockPaymentProvider::new();
        mock.set_webhook_event(MockPaymentProvider::checkout_completed_event("evt_1", 800));

        let event = mock.verify_webhook(b"ignored", "sig").await.unwrap();

        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, WebhookEventType::CheckoutSessionCompleted);
    }

    #[tokio::test]
    async fn unsigned_checkout_payload_is_parsed() {
        let mock = MockPaymentProvider::new();
        let payload = br#"{
            "id": "evt_2",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": { "object": {
                "id": "cs_2",
                "amount_total": 1200,
                "customer_details": { "email": "x@example.com", "name": "X" }
            } }
        }"#;

        let event = mock.verify_webhook(payload, "sig").await.unwrap();

        match event.data {
            WebhookEventData::Checkout(checkout) => {
                assert_eq!(checkout.session_id, "cs_2");
                assert_eq!(checkout.amount_total, Some(1200));
                assert_eq!(checkout.customer_email.as_deref(), Some("x@example.com"));
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn call_tracking_records_methods() {
        let mock = MockPaymentProvider::new();
        let _ = mock.verify_webhook(b"{}", "sig").await;
        let _ = mock.create_checkout_session(request()).await;

        assert!(mock.was_called("verify_webhook"));
        assert_eq!(mock.call_count("create_checkout_session"), 1);
        assert_eq!(mock.calls().len(), 2);
    }
}
