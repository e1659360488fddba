//! Backoff wait seam.
//!
//! The fetch loop waits through a [`Sleeper`] so that tests can record the
//! requested delays instead of sleeping. The production implementation is a
//! tokio timer, which parks only the calling task.

use std::time::Duration;

use async_trait::async_trait;

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    /// Suspends the current task for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
