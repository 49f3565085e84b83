//! Donation error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors raised while validating donation input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DonationError {
    /// Amount is missing, not a number, or not positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested checkout amount falls outside the configured bounds.
    #[error("Amount must be between {min} and {max}")]
    AmountOutOfRange { min: u32, max: u32 },

    /// The provider transaction id is empty.
    #[error("Missing provider transaction id")]
    MissingTransactionId,
}

impl DonationError {
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        DonationError::InvalidAmount(reason.into())
    }

    /// Machine-readable code for API responses.
    pub fn code(&self) -> ErrorCode {
        match self {
            DonationError::InvalidAmount(_) | DonationError::AmountOutOfRange { .. } => {
                ErrorCode::InvalidAmount
            }
            DonationError::MissingTransactionId => ErrorCode::ValidationFailed,
        }
    }

    /// All donation validation failures are client errors.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl From<DonationError> for DomainError {
    fn from(err: DonationError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
