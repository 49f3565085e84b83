//! Donation domain module.
//!
//! Everything needed to turn a verified "checkout completed" event into a
//! stored donation and a thank-you message, without touching I/O.
//!
//! # Module Structure
//!
//! - `amount` - Provider totals and payer-requested checkout amounts
//! - `donor` - Donor name defaults and email normalization
//! - `record` - Donations to insert and donations as stored
//! - `notification` - First-time and repeat thank-you messages
//! - `retry` - Insert retry policy and its outcome
//! - `errors` / `webhook_errors` - Rejections with HTTP status mapping

mod amount;
mod donor;
mod errors;
mod notification;
mod record;
mod retry;
mod webhook_errors;

pub use amount::{CheckoutAmount, DonationAmount};
pub use donor::{normalize_email, DonorName, PLACEHOLDER_DONOR_NAME};
pub use errors::DonationError;
pub use notification::{ThankYouEmail, ThankYouTemplate};
pub use record::{DonationRecord, NewDonation};
pub use retry::{PersistOutcome, RetryPolicy};
pub use webhook_errors::WebhookError;
