//! Coffee Fund - Buy-me-a-coffee donation service
//!
//! Starts Stripe checkouts for one-off donations, records completed payments
//! from verified Stripe webhooks, and thanks donors by email.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
