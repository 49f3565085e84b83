//! DonationRepository port - Persistence for donation records.
//!
//! Donations are append-only. An insert for a provider transaction id that is
//! already stored is not an error: it reports [`InsertOutcome::Duplicate`] so
//! the caller can skip side effects such as the thank-you email.

use async_trait::async_trait;

use crate::domain::donation::{DonationRecord, NewDonation};
use crate::domain::foundation::DomainError;

/// Result of inserting a donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted(DonationRecord),
    /// A row with the same provider transaction id already exists.
    Duplicate,
}

/// Port for donation storage.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Insert a donation unless its provider transaction id is already stored.
    ///
    /// # Errors
    ///
    /// `DatabaseError` on any store failure; callers may retry.
    async fn insert(&self, donation: &NewDonation) -> Result<InsertOutcome, DomainError>;

    /// Number of stored donations made with this email address.
    ///
    /// Matching ignores ASCII case.
    async fn count_by_email(&self, email: &str) -> Result<i64, DomainError>;

    /// Total number of stored donations.
    async fn count_all(&self) -> Result<i64, DomainError>;
}
