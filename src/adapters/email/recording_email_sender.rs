//! In-memory `EmailSender` that records every message instead of sending it.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::donation::ThankYouEmail;
use crate::ports::{EmailError, EmailReceipt, EmailSender};

#[derive(Default)]
struct RecordingState {
    sent: Vec<ThankYouEmail>,
    fail_with: Option<EmailError>,
}

/// Captures sent messages; optionally fails every send.
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    inner: Arc<Mutex<RecordingState>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every call fails with `error`.
    pub fn failing(error: EmailError) -> Self {
        let sender = Self::new();
        sender.state().fail_with = Some(error);
        sender
    }

    pub fn sent(&self) -> Vec<ThankYouEmail> {
        self.state().sent.clone()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_thank_you(&self, email: &ThankYouEmail) -> Result<EmailReceipt, EmailError> {
        let mut state = self.state();
        if let Some(error) = &state.fail_with {
            return Err(error.clone());
        }
        state.sent.push(email.clone());
        Ok(EmailReceipt {
            message_id: Some(format!("rec_{}", state.sent.len())),
        })
    }
}
