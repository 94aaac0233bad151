use std::{fmt::Display, future::Future, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fixed-delay retry: `attempts` tries in total, `delay` between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// The closure receives the 1-based attempt number. Returns the last
    /// error. Cancellation stops further attempts and interrupts the sleep
    /// between them.
    pub async fn run<T, E, F, Fut>(&self, cancel: &CancellationToken, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= attempts || cancel.is_cancelled() {
                return Err(error);
            }

            debug!(attempt, attempts, %error, "Attempt failed, retrying");

            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(self.delay) => false,
            };
            if cancelled {
                return Err(error);
            }

            attempt += 1;
        }
    }
}
