//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - Stripe checkout sessions and webhook verification
//! - `DonationRepository` - Donation storage and counts
//! - `EmailSender` - Donor thank-you delivery
//! - `WebhookEventRepository` - Per-event idempotency ledger
//! - `Sleeper` - Delay used by the insert retry loop

mod donation_repository;
mod email_sender;
mod payment_provider;
mod sleeper;
mod webhook_event_repository;

pub use donation_repository::{DonationRepository, InsertOutcome};
pub use email_sender::{EmailError, EmailReceipt, EmailSender};
pub use payment_provider::{
    CheckoutCompleted, CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode,
    PaymentProvider, WebhookEvent, WebhookEventData, WebhookEventType,
};
pub use sleeper::Sleeper;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus,
};
