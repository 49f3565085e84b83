//! Bounded retry for the donation insert.
//!
//! The policy is pure data: it only answers "how many attempts" and "how long
//! to wait after attempt n". The loop that applies it lives in the webhook
//! handler, which performs the waits through the `Sleeper` port.

use std::time::Duration;

/// Exponential backoff policy.
///
/// The delay after failed attempt `n` (1-based) is `initial_delay * 2^(n-1)`.
/// With the defaults that is 2s, 4s, 8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    /// Every delay the policy can produce, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .collect()
    }

    /// Worst-case time spent waiting.
    pub fn total_backoff(&self) -> Duration {
        self.schedule().into_iter().sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Result of trying to persist a donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Stored on the first attempt.
    Persisted,
    /// Stored after one or more failed attempts.
    PersistedAfterRetry { attempts: u32 },
    /// A row for this provider transaction already existed.
    Duplicate,
    /// Every attempt failed.
    Failed { attempts: u32, last_error: String },
}

impl PersistOutcome {
    /// The donation is in the store, whether written now or earlier.
    pub fn is_stored(&self) -> bool {
        !matches!(self, PersistOutcome::Failed { .. })
    }

    /// A donor should only be thanked once per donation.
    pub fn should_notify(&self) -> bool {
        !matches!(self, PersistOutcome::Duplicate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersistOutcome::Persisted => "persisted",
            PersistOutcome::PersistedAfterRetry { .. } => "persisted_after_retry",
            PersistOutcome::Duplicate => "duplicate",
            PersistOutcome::Failed { .. } => "failed",
        }
    }
}
