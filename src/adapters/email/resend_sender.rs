//! Resend email adapter.
//!
//! Sends donor thank-you messages through `POST /emails` on the Resend API.
//! The API key is held as a `SecretString` and only exposed when building the
//! bearer header.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmailConfig;
use crate::domain::donation::ThankYouEmail;
use crate::ports::{EmailError, EmailReceipt, EmailSender};

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Resend API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    api_key: SecretString,
    api_base_url: String,
    from: String,
    reply_to: Option<String>,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.resend.com".to_string(),
            from: from.into(),
            reply_to: None,
        }
    }

    pub fn from_email_config(config: &EmailConfig) -> Self {
        let mut resend = Self::new(config.resend_api_key.clone(), config.from_header())
            .with_base_url(config.api_base_url.clone());
        resend.reply_to = config.reply_to.clone();
        resend
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendErrorResponse {
    message: Option<String>,
}

pub struct ResendEmailSender {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendEmailSender {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_thank_you(&self, email: &ThankYouEmail) -> Result<EmailReceipt, EmailError> {
        if !email.to.contains('@') {
            return Err(EmailError::InvalidRecipient(
                "address has no domain part".to_string(),
            ));
        }

        let body = SendEmailRequest {
            from: &self.config.from,
            to: [email.to.as_str()],
            subject: email.subject(),
            html: email.html_body(),
            text: email.text_body(),
            reply_to: self.config.reply_to.as_deref(),
        };

        let response = self
            .http_client
            .post(format!("{}/emails", self.config.api_base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(API_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ResendErrorResponse>(&text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(text);
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendEmailResponse = response
            .json()
            .await
            .unwrap_or(SendEmailResponse { id: None });

        tracing::debug!(
            template = %email.template,
            message_id = ?parsed.id,
            "Thank-you email accepted by Resend"
        );

        Ok(EmailReceipt {
            message_id: parsed.id,
        })
    }
}
