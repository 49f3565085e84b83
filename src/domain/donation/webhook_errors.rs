//! Webhook error types for Stripe webhook handling.
//!
//! Only failures that happen before an event is acknowledged live here. Once a
//! verified checkout has passed amount validation, every later problem is
//! reported as an outcome value and the event is still acknowledged with 200,
//! because any non-2xx status makes Stripe redeliver the same event.

use axum::http::StatusCode;
use thiserror::Error;

use super::errors::DonationError;

/// Errors that reject a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Request used a method other than POST.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The `Stripe-Signature` header was absent.
    #[error("Missing Stripe-Signature header")]
    MissingSignature,

    /// Signature, timestamp, or payload failed verification.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Completed checkout carried no usable total.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unexpected failure before the event could be acknowledged.
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl WebhookError {
    /// Returns true if Stripe should redeliver this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Infrastructure(_))
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 4xx: rejected, Stripe gives up after its retry schedule
    /// - 5xx: Stripe redelivers
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature(_)
            | WebhookError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            WebhookError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            WebhookError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature(_) => "INVALID_SIGNATURE",
            WebhookError::InvalidAmount(_) => "INVALID_AMOUNT",
            WebhookError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DonationError> for WebhookError {
    fn from(err: DonationError) -> Self {
        match err {
            DonationError::InvalidAmount(reason) => WebhookError::InvalidAmount(reason),
            other => WebhookError::InvalidAmount(other.to_string()),
        }
    }
}
