//! Sleeper port - Injectable delay for retry backoff.
//!
//! Production code waits on the tokio timer; tests record requested delays
//! and return immediately.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
