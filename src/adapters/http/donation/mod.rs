//! HTTP adapter for donation endpoints.
//!
//! - `POST /api/stripe-webhook` - Handle Stripe webhooks
//! - `POST /api/create-checkout-session` - Start checkout, JSON response
//! - `GET|POST /api/create-checkout-redirect` - Start checkout, redirect
//! - `GET /api/donation-count` - Donation counter
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{DonationAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{donation_router, donation_routes, with_middleware};
