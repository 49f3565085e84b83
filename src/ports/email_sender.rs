//! EmailSender port - Delivery of donor thank-you messages.
//!
//! Sending is best-effort from the caller's point of view: a failure is
//! reported, never retried here.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::donation::ThankYouEmail;

/// Port for transactional email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one thank-you message.
    async fn send_thank_you(&self, email: &ThankYouEmail) -> Result<EmailReceipt, EmailError>;
}

/// Acknowledgement from the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailReceipt {
    /// Provider message ID, when returned.
    pub message_id: Option<String>,
}

/// Email delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// The provider could not be reached.
    #[error("Email provider unreachable: {0}")]
    Network(String),

    /// The provider refused the message.
    #[error("Email provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The recipient address is unusable.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}
