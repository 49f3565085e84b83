//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::from_payment_config(&app_config.payment);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::PaymentConfig;
use crate::ports::{
    CheckoutCompleted, CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode,
    PaymentProvider, WebhookEvent, WebhookEventData, WebhookEventType,
};

use super::webhook_types::{
    SignatureHeader, StripeApiErrorResponse, StripeCheckoutSession, StripePaymentIntent,
    StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Per-request timeout for Stripe API calls.
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Reject events not sent in live mode.
    require_livemode: bool,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
        }
    }

    /// Build from the validated application configuration.
    pub fn from_payment_config(config: &PaymentConfig) -> Self {
        Self::new(
            config.stripe_api_key.clone(),
            config.stripe_webhook_secret.clone(),
        )
        .with_base_url(config.stripe_api_base_url.clone())
        .with_require_livemode(config.require_livemode)
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reject test-mode events.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// Accepts the payload if any `v1` signature matches.
    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), PaymentError> {
        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now.checked_sub(header.timestamp).ok_or_else(|| {
            tracing::warn!(
                event_timestamp = header.timestamp,
                "Webhook timestamp out of range"
            );
            PaymentError::invalid_webhook("Invalid timestamp")
        })?;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        // 2. Compute expected signature over "{t}.{raw body}"
        let mut mac =
            HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
                .map_err(|e| PaymentError::invalid_webhook(format!("Unusable webhook secret: {e}")))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison against every v1 candidate
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));

        if !matched {
            tracing::warn!(
                candidates = header.v1_signatures.len(),
                "Invalid webhook signature"
            );
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a Stripe event and convert to port types.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(
                event_id = %stripe_event.id,
                "Rejected test mode event"
            );
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed",
            ));
        }

        let event_type = WebhookEventType::from_provider(&stripe_event.event_type);
        let data = Self::extract_event_data(&event_type, &stripe_event)?;

        Ok(WebhookEvent {
            id: stripe_event.id,
            event_type,
            data,
            created_at: stripe_event.created,
            livemode: stripe_event.livemode,
        })
    }

    /// Extract event data from the Stripe object.
    fn extract_event_data(
        event_type: &WebhookEventType,
        event: &StripeWebhookEvent,
    ) -> Result<WebhookEventData, PaymentError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        PaymentError::invalid_webhook(format!("Invalid checkout session: {}", e))
                    })?;

                Ok(WebhookEventData::Checkout(CheckoutCompleted {
                    customer_email: session.payer_email().map(str::to_string),
                    customer_name: session.payer_name().map(str::to_string),
                    session_id: session.id,
                    amount_total: session.amount_total,
                    currency: session.currency,
                    payment_status: session.payment_status,
                }))
            }

            WebhookEventType::PaymentIntentFailed => {
                let intent: StripePaymentIntent =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        PaymentError::invalid_webhook(format!("Invalid payment intent: {}", e))
                    })?;

                Ok(WebhookEventData::PaymentFailed {
                    payment_intent_id: intent.id,
                    failure_message: intent.last_payment_error.and_then(|e| e.message),
                })
            }

            WebhookEventType::Unknown(_) => Ok(WebhookEventData::Raw {
                json: event.data.object.to_string(),
            }),
        }
    }

    /// Form parameters for `POST /v1/checkout/sessions`.
    fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];

        if let Some(description) = &request.product_description {
            params.push((
                "line_items[0][price_data][product_data][description]".to_string(),
                description.clone(),
            ));
        }

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }

        params
    }

    /// Turn a non-2xx Stripe response into a `PaymentError`.
    async fn api_error(response: reqwest::Response) -> PaymentError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let code = PaymentErrorCode::from_http_status(status);

        match serde_json::from_str::<StripeApiErrorResponse>(&body) {
            Ok(parsed) => {
                let message = parsed
                    .error
                    .message
                    .unwrap_or_else(|| format!("Stripe API error ({status})"));
                let error = PaymentError::new(code, message);
                match parsed.error.code {
                    Some(provider_code) => error.with_provider_code(provider_code),
                    None => error,
                }
            }
            Err(_) => PaymentError::new(code, format!("Stripe API error ({status}): {body}")),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = Self::checkout_params(&request);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .timeout(API_TIMEOUT)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::api_error(response).await;
            tracing::error!(
                code = %error.code,
                provider_code = ?error.provider_code,
                "Stripe create_checkout_session failed"
            );
            return Err(error);
        }

        let stripe_session: StripeCheckoutSession = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = stripe_session.url.ok_or_else(|| {
            PaymentError::provider(format!(
                "Checkout session {} has no hosted URL",
                stripe_session.id
            ))
        })?;

        tracing::info!(
            session_id = %stripe_session.id,
            unit_amount = request.unit_amount,
            "Stripe checkout session created"
        );

        Ok(CheckoutSession {
            id: stripe_session.id,
            url,
            expires_at: stripe_session.expires_at,
        })
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(payload, &header)?;

        // 3. Parse and convert event
        let webhook_event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %webhook_event.id,
            event_type = %webhook_event.event_type,
            "Webhook signature verified"
        );

        Ok(webhook_event)
    }
}

/// Builds a valid `Stripe-Signature` header for `payload`.
#[cfg(test)]
pub(crate) fn create_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Form, Json, Router};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    const SECRET: &str = "whsec_test_secret";

    fn test_config() -> StripeConfig {
        StripeConfig::new("sk_test_key", SECRET)
    }

    fn checkout_payload() -> String {
        r#"{
            "id": "evt_test123",
            "type": "checkout.session.completed",
            "created": 1704067200,
            "data": {
                "object": {
                    "id": "cs_test_abc",
                    "object": "checkout.session",
                    "amount_total": 800,
                    "currency": "usd",
                    "customer_details": { "email": "a@example.com", "name": "Ada Lovelace" },
                    "payment_status": "paid",
                    "status": "complete",
                    "mode": "payment",
                    "metadata": {}
                }
            },
            "livemode": false,
            "pending_webhooks": 1
        }"#
        .to_string()
    }

    fn checkout_request() -> CreateCheckoutRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("amount".to_string(), "4.5".to_string());
        metadata.insert("type".to_string(), "coffee_support".to_string());
        CreateCheckoutRequest {
            unit_amount: 450,
            currency: "usd".to_string(),
            product_name: "Buy Me a Coffee".to_string(),
            product_description: None,
            success_url: "https://everycity.example?success=true".to_string(),
            cancel_url: "https://everycity.example?canceled=true".to_string(),
            metadata,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = StripeConfig::new("api_key", "webhook_secret");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert!(!config.require_livemode);
    }

    #[test]
    fn config_with_base_url_trims_trailing_slash() {
        let config = StripeConfig::new("key", "secret").with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn config_from_payment_config() {
        let payment = PaymentConfig {
            stripe_api_key: "sk_live_1".to_string(),
            stripe_webhook_secret: "whsec_1".to_string(),
            stripe_api_base_url: "http://stripe-mock:12111".to_string(),
            require_livemode: true,
        };
        let config = StripeConfig::from_payment_config(&payment);
        assert_eq!(config.api_base_url, "http://stripe-mock:12111");
        assert!(config.require_livemode);
        assert_eq!(config.webhook_secret.expose_secret(), "whsec_1");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn verify_signature_valid() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = create_test_signature(SECRET, timestamp, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(adapter.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_signature_accepts_any_matching_v1() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let good = create_test_signature(SECRET, timestamp, payload);
        let good_v1 = good.split_once("v1=").unwrap().1;
        let header_text = format!("t={timestamp},v1={},v1={good_v1}", "00".repeat(32));

        let header = SignatureHeader::parse(&header_text).unwrap();
        assert!(adapter.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_signature_wrong_secret() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = create_test_signature("wrong_secret", timestamp, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        let err = adapter
            .verify_signature(payload.as_bytes(), &header)
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[test]
    fn verify_signature_tampered_body() {
        let adapter = StripePaymentAdapter::new(test_config());
        let timestamp = chrono::Utc::now().timestamp();
        let signature = create_test_signature(SECRET, timestamp, r#"{"amount_total":800}"#);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(adapter
            .verify_signature(br#"{"amount_total":80000}"#, &header)
            .is_err());
    }

    #[test]
    fn verify_signature_expired_timestamp() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let old_timestamp = chrono::Utc::now().timestamp() - 600;
        let signature = create_test_signature(SECRET, old_timestamp, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        let err = adapter
            .verify_signature(payload.as_bytes(), &header)
            .unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn verify_signature_future_timestamp() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let future = chrono::Utc::now().timestamp() + 600;
        let signature = create_test_signature(SECRET, future, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        let err = adapter
            .verify_signature(payload.as_bytes(), &header)
            .unwrap_err();
        assert!(err.message.contains("future"));
    }

    #[test]
    fn verify_signature_tolerates_small_clock_skew() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let slightly_ahead = chrono::Utc::now().timestamp() + 30;
        let signature = create_test_signature(SECRET, slightly_ahead, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(adapter.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_signature_rejects_out_of_range_timestamp() {
        let adapter = StripePaymentAdapter::new(test_config());
        let header = SignatureHeader::parse("t=-9223372036854775808,v1=00").unwrap();

        let err = adapter.verify_signature(b"{}", &header).unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
        assert!(err.message.contains("Invalid timestamp"));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_extreme_timestamps() {
        let adapter = StripePaymentAdapter::new(test_config());

        for signature in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            let result = adapter.verify_webhook(b"{}", signature).await;
            assert_eq!(result.unwrap_err().code, PaymentErrorCode::InvalidWebhook);
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // verify_webhook Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn verify_webhook_extracts_checkout_facts() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = checkout_payload();
        let signature = create_test_signature(SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = adapter
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.event_type, WebhookEventType::CheckoutSessionCompleted);
        match event.data {
            WebhookEventData::Checkout(checkout) => {
                assert_eq!(checkout.session_id, "cs_test_abc");
                assert_eq!(checkout.amount_total, Some(800));
                assert_eq!(checkout.customer_email.as_deref(), Some("a@example.com"));
                assert_eq!(checkout.customer_name.as_deref(), Some("Ada Lovelace"));
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[tokio::test]
    async fn verify_webhook_maps_payment_failed() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{
            "id": "evt_fail",
            "type": "payment_intent.payment_failed",
            "created": 1704067200,
            "livemode": false,
            "data": { "object": {
                "id": "pi_1",
                "last_payment_error": { "message": "Your card was declined." }
            } }
        }"#;
        let signature = create_test_signature(SECRET, chrono::Utc::now().timestamp(), payload);

        let event = adapter
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        assert_eq!(event.event_type, WebhookEventType::PaymentIntentFailed);
        assert_eq!(
            event.data,
            WebhookEventData::PaymentFailed {
                payment_intent_id: "pi_1".to_string(),
                failure_message: Some("Your card was declined.".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn verify_webhook_keeps_unknown_types_raw() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_x","type":"customer.created","created":1,"livemode":false,"data":{"object":{"id":"cus_1"}}}"#;
        let signature = create_test_signature(SECRET, chrono::Utc::now().timestamp(), payload);

        let event = adapter
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        assert_eq!(
            event.event_type,
            WebhookEventType::Unknown("customer.created".to_string())
        );
        assert!(matches!(event.data, WebhookEventData::Raw { .. }));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_invalid_signature() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let signature = format!("t={},v1={}", chrono::Utc::now().timestamp(), "ab".repeat(32));

        let result = adapter.verify_webhook(payload.as_bytes(), &signature).await;

        assert_eq!(result.unwrap_err().code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn verify_webhook_rejects_malformed_header() {
        let adapter = StripePaymentAdapter::new(test_config());
        let result = adapter
            .verify_webhook(br#"{"id":"evt_test"}"#, "malformed_header")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verify_webhook_rejects_invalid_json() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = "not valid json";
        let signature = create_test_signature(SECRET, chrono::Utc::now().timestamp(), payload);

        let result = adapter.verify_webhook(payload.as_bytes(), &signature).await;

        assert!(result.unwrap_err().message.contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn verify_webhook_rejects_test_events_when_livemode_required() {
        let adapter = StripePaymentAdapter::new(test_config().with_require_livemode(true));
        let payload = checkout_payload();
        let signature = create_test_signature(SECRET, chrono::Utc::now().timestamp(), &payload);

        let result = adapter.verify_webhook(payload.as_bytes(), &signature).await;

        assert!(result.unwrap_err().message.contains("Test mode"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout Session Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_params_describe_single_line_item() {
        let params: HashMap<String, String> =
            StripePaymentAdapter::checkout_params(&checkout_request())
                .into_iter()
                .collect();

        assert_eq!(params["mode"], "payment");
        assert_eq!(params["line_items[0][price_data][unit_amount]"], "450");
        assert_eq!(params["line_items[0][price_data][currency]"], "usd");
        assert_eq!(params["line_items[0][quantity]"], "1");
        assert_eq!(params["metadata[type]"], "coffee_support");
        assert!(!params.contains_key("line_items[0][price_data][product_data][description]"));
    }

    type Captured = Arc<Mutex<Option<HashMap<String, String>>>>;

    /// Serves `/v1/checkout/sessions` on a random local port.
    async fn spawn_stripe_stub(status: u16, body: serde_json::Value) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let state = (captured.clone(), status, body);

        async fn handler(
            State((captured, status, body)): State<(Captured, u16, serde_json::Value)>,
            Form(form): Form<HashMap<String, String>>,
        ) -> (axum::http::StatusCode, Json<serde_json::Value>) {
            *captured.lock().unwrap() = Some(form);
            (axum::http::StatusCode::from_u16(status).unwrap(), Json(body))
        }

        let app = Router::new()
            .route("/v1/checkout/sessions", post(handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), captured)
    }

    #[tokio::test]
    async fn create_checkout_session_returns_hosted_url() {
        let (base_url, captured) = spawn_stripe_stub(
            200,
            serde_json::json!({
                "id": "cs_test_123",
                "object": "checkout.session",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123",
                "expires_at": 1704153600
            }),
        )
        .await;
        let adapter = StripePaymentAdapter::new(test_config().with_base_url(base_url));

        let session = adapter
            .create_checkout_session(checkout_request())
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_123");
        assert_eq!(session.expires_at, Some(1704153600));

        let form = captured.lock().unwrap().clone().unwrap();
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "450");
        assert_eq!(form["metadata[amount]"], "4.5");
    }

    #[tokio::test]
    async fn create_checkout_session_maps_api_errors() {
        let (base_url, _) = spawn_stripe_stub(
            400,
            serde_json::json!({
                "error": {
                    "message": "Invalid currency: xyz",
                    "code": "parameter_invalid_string",
                    "type": "invalid_request_error"
                }
            }),
        )
        .await;
        let adapter = StripePaymentAdapter::new(test_config().with_base_url(base_url));

        let err = adapter
            .create_checkout_session(checkout_request())
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        assert_eq!(err.message, "Invalid currency: xyz");
        assert_eq!(err.provider_code.as_deref(), Some("parameter_invalid_string"));
    }

    #[tokio::test]
    async fn create_checkout_session_requires_url() {
        let (base_url, _) =
            spawn_stripe_stub(200, serde_json::json!({ "id": "cs_test_no_url" })).await;
        let adapter = StripePaymentAdapter::new(test_config().with_base_url(base_url));

        let err = adapter
            .create_checkout_session(checkout_request())
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::ProviderError);
    }

    #[tokio::test]
    async fn create_checkout_session_network_failure() {
        // Port 9 (discard) is not listening on loopback in test environments
        let adapter =
            StripePaymentAdapter::new(test_config().with_base_url("http://127.0.0.1:9"));

        let err = adapter
            .create_checkout_session(checkout_request())
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NetworkError);
        assert!(err.retryable);
    }
}
