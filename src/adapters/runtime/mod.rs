//! Runtime adapters.

mod tokio_sleeper;

pub use tokio_sleeper::TokioSleeper;
