//! GetDonationCountHandler - Query for the public donation counter.
//!
//! The counter is decorative, so it never fails: a store error yields
//! [`FALLBACK_DONATION_COUNT`] instead.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::ports::DonationRepository;

/// Count reported when the store cannot be queried.
pub const FALLBACK_DONATION_COUNT: i64 = 2;

#[derive(Debug, Clone, Default)]
pub struct GetDonationCountQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDonationCountResult {
    pub count: i64,
    pub timestamp: Timestamp,
    /// True when `count` is the fallback value.
    pub is_fallback: bool,
}

pub struct GetDonationCountHandler {
    repository: Arc<dyn DonationRepository>,
}

impl GetDonationCountHandler {
    pub fn new(repository: Arc<dyn DonationRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, _query: GetDonationCountQuery) -> GetDonationCountResult {
        let (count, is_fallback) = match self.repository.count_all().await {
            Ok(count) => (count, false),
            Err(e) => {
                tracing::warn!(error = %e, "Donation count unavailable, using fallback");
                (FALLBACK_DONATION_COUNT, true)
            }
        };

        GetDonationCountResult {
            count,
            timestamp: Timestamp::now(),
            is_fallback,
        }
    }
}
