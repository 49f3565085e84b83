//! Donation amounts.
//!
//! Two directions, two types:
//!
//! - [`DonationAmount`] is what the payment provider reports on a completed
//!   checkout, in minor units. The stored major-unit value is always derived
//!   from it by dividing by 100, never taken from user input.
//! - [`CheckoutAmount`] is what a payer asks to give before checkout, in major
//!   units. It is bounded by configuration and converted to minor units with
//!   half-up rounding.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

use super::errors::DonationError;

/// A completed donation total in minor units (cents). Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DonationAmount(i64);

impl DonationAmount {
    /// Creates an amount from minor units.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if the value is zero or negative.
    pub fn from_minor_units(minor_units: i64) -> Result<Self, DonationError> {
        if minor_units <= 0 {
            return Err(DonationError::invalid_amount(format!(
                "total must be positive, got {minor_units}"
            )));
        }
        Ok(Self(minor_units))
    }

    /// Creates an amount from the provider's optional session total.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if the total is missing, zero, or negative.
    pub fn from_provider_total(total: Option<i64>) -> Result<Self, DonationError> {
        let total =
            total.ok_or_else(|| DonationError::invalid_amount("amount total is missing"))?;
        Self::from_minor_units(total)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Major units with scale 2, e.g. `800` becomes `8.00`.
    pub fn to_major_units(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major_units())
    }
}

/// A donation amount requested by the payer, in major units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutAmount(Decimal);

impl CheckoutAmount {
    /// Parses user input such as `"5"`, `"4.50"` or a JSON number's text.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if the input is not a plain decimal number, and
    /// `AmountOutOfRange` if it falls outside `[min, max]`.
    pub fn parse(raw: &str, min: u32, max: u32) -> Result<Self, DonationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DonationError::invalid_amount("amount is required"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| DonationError::invalid_amount(format!("'{trimmed}' is not a number")))?;
        Self::new(value, min, max)
    }

    /// # Errors
    ///
    /// `AmountOutOfRange` if `value` falls outside `[min, max]`.
    pub fn new(value: Decimal, min: u32, max: u32) -> Result<Self, DonationError> {
        if value < Decimal::from(min) || value > Decimal::from(max) {
            return Err(DonationError::AmountOutOfRange { min, max });
        }
        Ok(Self(value.normalize()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Price in minor units, rounded half-up: `4.995` becomes `500`.
    pub fn unit_amount(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(i64::MAX)
    }
}

impl fmt::Display for CheckoutAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
