//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `donation` - Amounts, donors, records, thank-you messages, retry policy

pub mod donation;
pub mod foundation;
