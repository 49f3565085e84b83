//! HTTP handlers for donation endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::donation::{
    CreateCheckoutCommand, CreateCheckoutError, CreateCheckoutHandler, GetDonationCountHandler,
    GetDonationCountQuery, HandleDonationWebhookCommand, HandleDonationWebhookHandler,
    HandleDonationWebhookResult,
};
use crate::config::CheckoutConfig;
use crate::domain::donation::{RetryPolicy, WebhookError};
use crate::ports::{
    DonationRepository, EmailSender, PaymentProvider, Sleeper, WebhookEventRepository,
};

use super::dto::{
    CheckoutBody, CheckoutErrorResponse, CheckoutRedirectQuery, CheckoutUrlResponse,
    DonationCountResponse, ErrorResponse, WebhookAckResponse,
};

/// Header Stripe signs webhook deliveries with.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct DonationAppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub donation_repository: Arc<dyn DonationRepository>,
    pub email_sender: Arc<dyn EmailSender>,
    pub webhook_event_repository: Arc<dyn WebhookEventRepository>,
    pub sleeper: Arc<dyn Sleeper>,
    pub checkout: CheckoutConfig,
    pub retry_policy: RetryPolicy,
    /// Include provider error text in checkout 500 responses.
    pub expose_error_details: bool,
}

impl DonationAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> HandleDonationWebhookHandler {
        HandleDonationWebhookHandler::new(
            self.payment_provider.clone(),
            self.donation_repository.clone(),
            self.email_sender.clone(),
            self.webhook_event_repository.clone(),
            self.sleeper.clone(),
        )
        .with_retry_policy(self.retry_policy)
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.payment_provider.clone(), self.checkout.clone())
    }

    pub fn donation_count_handler(&self) -> GetDonationCountHandler {
        GetDonationCountHandler::new(self.donation_repository.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/stripe-webhook - Handle Stripe webhook events
pub async fn handle_stripe_webhook(
    State(state): State<DonationAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleDonationWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook_handler().handle(cmd).await?;

    if let HandleDonationWebhookResult::DonationRecorded {
        event_id,
        persist,
        notification,
        ..
    } = &result
    {
        tracing::debug!(
            event_id = %event_id,
            persist = persist.as_str(),
            notification = notification.as_str(),
            "Webhook acknowledged"
        );
    }

    Ok(Json(WebhookAckResponse::from(&result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/create-checkout-session - Start checkout, respond with the session URL
pub async fn create_checkout_session(
    State(state): State<DonationAppState>,
    body: Bytes,
) -> Result<Json<CheckoutUrlResponse>, CheckoutApiError> {
    let amount = parse_checkout_body(&body).amount_text();

    let result = state
        .checkout_handler()
        .handle(CreateCheckoutCommand { amount })
        .await
        .map_err(|e| CheckoutApiError::new(e, "Invalid amount", state.expose_error_details))?;

    Ok(Json(CheckoutUrlResponse { url: result.url }))
}

/// GET /api/create-checkout-redirect?amount=5 - Start checkout, redirect to Stripe
pub async fn create_checkout_redirect_get(
    State(state): State<DonationAppState>,
    Query(query): Query<CheckoutRedirectQuery>,
) -> Result<Response, CheckoutApiError> {
    checkout_redirect(&state, query.amount.unwrap_or_default()).await
}

/// POST /api/create-checkout-redirect - Same as GET, amount in the JSON body
pub async fn create_checkout_redirect_post(
    State(state): State<DonationAppState>,
    body: Bytes,
) -> Result<Response, CheckoutApiError> {
    checkout_redirect(&state, parse_checkout_body(&body).amount_text()).await
}

async fn checkout_redirect(
    state: &DonationAppState,
    amount: String,
) -> Result<Response, CheckoutApiError> {
    let result = state
        .checkout_handler()
        .handle(CreateCheckoutCommand { amount })
        .await
        .map_err(|e| {
            CheckoutApiError::new(e, "Invalid amount provided", state.expose_error_details)
        })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, result.url)]).into_response())
}

/// Unparseable bodies are treated as carrying no amount.
fn parse_checkout_body(body: &[u8]) -> CheckoutBody {
    serde_json::from_slice(body).unwrap_or_default()
}

// ════════════════════════════════════════════════════════════════════════════════
// Counter and Health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/donation-count - Public donation counter; never fails
pub async fn get_donation_count(State(state): State<DonationAppState>) -> impl IntoResponse {
    let result = state
        .donation_count_handler()
        .handle(GetDonationCountQuery)
        .await;
    Json(DonationCountResponse::from(result))
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "OK"
}

/// Any method a route does not serve.
pub async fn method_not_allowed() -> impl IntoResponse {
    let err = WebhookError::MethodNotAllowed;
    (
        err.status_code(),
        Json(ErrorResponse::new(err.error_code(), err.to_string())),
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper for webhook failures.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Webhook processing failed");
        }
        let body = ErrorResponse::new(self.0.error_code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// API error wrapper for checkout failures, rendered in the flat `{ "error" }` shape.
#[derive(Debug)]
pub struct CheckoutApiError {
    error: CreateCheckoutError,
    invalid_amount_message: &'static str,
    expose_details: bool,
}

impl CheckoutApiError {
    pub fn new(
        error: CreateCheckoutError,
        invalid_amount_message: &'static str,
        expose_details: bool,
    ) -> Self {
        Self {
            error,
            invalid_amount_message,
            expose_details,
        }
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        match self.error {
            CreateCheckoutError::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                Json(CheckoutErrorResponse::new(self.invalid_amount_message)),
            )
                .into_response(),
            CreateCheckoutError::Provider(e) => {
                let mut body = CheckoutErrorResponse::new("Failed to create checkout session");
                if self.expose_details {
                    body = body.with_details(e.message);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
