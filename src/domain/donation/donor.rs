//! Donor identity as collected by the hosted checkout page.

use std::fmt;

/// Name recorded when checkout did not collect one.
pub const PLACEHOLDER_DONOR_NAME: &str = "Coffee Supporter";

/// Donor display name. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorName(String);

impl DonorName {
    /// Uses the provided name when it has visible characters, otherwise the
    /// placeholder.
    pub fn from_optional(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Self(name.to_string()),
            None => Self::placeholder(),
        }
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_DONOR_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading whitespace-separated token, used to greet the donor.
    pub fn first_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(&self.0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_DONOR_NAME
    }
}

impl fmt::Display for DonorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes an optional email address: trims, lowercases, and drops blanks.
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
}
