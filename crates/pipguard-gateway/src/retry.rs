//! Retry helper for broker mutations.
//!
//! Escalating backoff: attempt n sleeps `base_delay * n` before the
//! next try. Non-retryable errors return immediately so a rejected
//! request (invalid stops, market closed) never burns the full budget.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::GatewayResult;

/// Bounded retry with escalating backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Run `op` until it succeeds, fails terminally, or the attempt
    /// budget is exhausted.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> GatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    warn!(attempt, max = self.max_attempts, error = %err, "retrying broker request");
                    tokio::time::sleep(self.base_delay * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
