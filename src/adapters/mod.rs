//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `stripe` - Payment provider (checkout sessions, webhook verification)
//! - `postgres` - Donation and webhook event storage
//! - `email` - Thank-you delivery through Resend
//! - `runtime` - Tokio-backed sleeper for retry backoff
//! - `http` - Axum routes and handlers

pub mod email;
pub mod http;
pub mod postgres;
pub mod runtime;
pub mod stripe;
