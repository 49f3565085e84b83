//! Request and response DTOs for donation endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::donation::{GetDonationCountResult, HandleDonationWebhookResult};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/create-checkout-session` and `POST /api/create-checkout-redirect`.
///
/// Browsers send `amount` as a JSON number or as a string; both are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutBody {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

impl CheckoutBody {
    /// Amount text for validation; anything that is not a number or string is empty.
    pub fn amount_text(&self) -> String {
        match &self.amount {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Query string of `GET /api/create-checkout-redirect`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRedirectQuery {
    pub amount: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned for every verified webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAckResponse {
    pub received: bool,
    pub event_type: String,
    pub event_id: String,
}

impl From<&HandleDonationWebhookResult> for WebhookAckResponse {
    fn from(result: &HandleDonationWebhookResult) -> Self {
        Self {
            received: true,
            event_type: result.event_type().to_string(),
            event_id: result.event_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutUrlResponse {
    pub url: String,
}

/// Flat error body used by the checkout endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CheckoutErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationCountResponse {
    pub count: i64,
    /// RFC 3339
    pub timestamp: String,
}

impl From<GetDonationCountResult> for DonationCountResponse {
    fn from(result: GetDonationCountResult) -> Self {
        Self {
            count: result.count,
            timestamp: result.timestamp.to_rfc3339(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    // ════════════════════════════════════════════════════════════════════════════
    // Request DTO Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_body_accepts_number_and_string() {
        let number: CheckoutBody = serde_json::from_str(r#"{"amount": 4.5}"#).unwrap();
        let text: CheckoutBody = serde_json::from_str(r#"{"amount": "5"}"#).unwrap();

        assert_eq!(number.amount_text(), "4.5");
        assert_eq!(text.amount_text(), "5");
    }

    #[test]
    fn checkout_body_without_amount_is_empty() {
        let missing: CheckoutBody = serde_json::from_str("{}").unwrap();
        let wrong_type: CheckoutBody = serde_json::from_str(r#"{"amount": true}"#).unwrap();

        assert_eq!(missing.amount_text(), "");
        assert_eq!(wrong_type.amount_text(), "");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Response DTO Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn webhook_ack_uses_camel_case() {
        let result = HandleDonationWebhookResult::Ignored {
            event_id: "evt_1".to_string(),
            event_type: "customer.created".to_string(),
        };

        let json = serde_json::to_value(WebhookAckResponse::from(&result)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "received": true,
                "eventType": "customer.created",
                "eventId": "evt_1"
            })
        );
    }

    #[test]
    fn checkout_error_omits_missing_details() {
        let json = serde_json::to_value(CheckoutErrorResponse::new("Invalid amount")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Invalid amount" }));

        let json = serde_json::to_value(
            CheckoutErrorResponse::new("Failed to create checkout session").with_details("boom"),
        )
        .unwrap();
        assert_eq!(json["details"], "boom");
    }

    #[test]
    fn donation_count_serializes_timestamp_as_rfc3339() {
        let response = DonationCountResponse::from(GetDonationCountResult {
            count: 12,
            timestamp: Timestamp::now(),
            is_fallback: false,
        });

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["count"], 12);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_value(ErrorResponse::new("INVALID_SIGNATURE", "bad")).unwrap();
        assert_eq!(json["error_code"], "INVALID_SIGNATURE");
        assert_eq!(json["message"], "bad");
    }
}
