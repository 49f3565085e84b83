//! Donation handlers.
//!
//! ## Commands
//! - Processing Stripe webhook deliveries into donations and thank-you emails
//! - Creating hosted checkout sessions
//!
//! ## Queries
//! - Public donation counter

mod create_checkout;
mod get_donation_count;
mod handle_donation_webhook;

// Commands
pub use create_checkout::{
    CreateCheckoutCommand, CreateCheckoutError, CreateCheckoutHandler, CreateCheckoutResult,
    CHECKOUT_METADATA_TYPE,
};
pub use handle_donation_webhook::{
    DonationSummary, HandleDonationWebhookCommand, HandleDonationWebhookHandler,
    HandleDonationWebhookResult, NotificationOutcome,
};

// Queries
pub use get_donation_count::{
    GetDonationCountHandler, GetDonationCountQuery, GetDonationCountResult,
    FALLBACK_DONATION_COUNT,
};
