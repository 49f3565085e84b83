//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresDonationRepository` - Donation rows and counts
//! - `PostgresWebhookEventRepository` - Processed webhook event ledger

mod donation_repository;
mod webhook_event_repository;

pub use donation_repository::PostgresDonationRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
