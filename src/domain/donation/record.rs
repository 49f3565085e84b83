//! Donation records.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::foundation::{DonationId, Timestamp};

use super::amount::DonationAmount;
use super::donor::{normalize_email, DonorName};
use super::errors::DonationError;

/// A donation ready to be inserted.
///
/// Built only from a verified completed-checkout event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    stripe_id: String,
    amount: DonationAmount,
    customer_email: Option<String>,
    customer_name: DonorName,
}

impl NewDonation {
    /// # Errors
    ///
    /// `MissingTransactionId` if `stripe_id` is blank.
    pub fn new(
        stripe_id: impl Into<String>,
        amount: DonationAmount,
        customer_email: Option<&str>,
        customer_name: Option<&str>,
    ) -> Result<Self, DonationError> {
        let stripe_id = stripe_id.into();
        if stripe_id.trim().is_empty() {
            return Err(DonationError::MissingTransactionId);
        }
        Ok(Self {
            stripe_id,
            amount,
            customer_email: normalize_email(customer_email),
            customer_name: DonorName::from_optional(customer_name),
        })
    }

    pub fn stripe_id(&self) -> &str {
        &self.stripe_id
    }

    pub fn amount(&self) -> DonationAmount {
        self.amount
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn customer_name(&self) -> &DonorName {
        &self.customer_name
    }
}

/// A persisted donation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationRecord {
    pub id: DonationId,
    /// Major units, scale 2
    pub amount: Decimal,
    pub stripe_id: String,
    pub customer_email: Option<String>,
    pub customer_name: String,
    pub created_at: Timestamp,
}
