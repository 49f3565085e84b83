//! Email adapters - Implementations of the `EmailSender` port.
//!
//! - `ResendEmailSender` - Resend HTTP API
//! - `RecordingEmailSender` - Captures messages for tests

mod recording_email_sender;
mod resend_sender;

pub use recording_email_sender::RecordingEmailSender;
pub use resend_sender::{ResendConfig, ResendEmailSender};
