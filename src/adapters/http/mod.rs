//! HTTP adapters - REST API implementations.

pub mod donation;

pub use donation::{donation_router, with_middleware, DonationAppState};
