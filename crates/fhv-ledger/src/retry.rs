//! Backoff for idempotent ledger reads.
//!
//! View calls, confirmation polls and the wallet account lookup may be
//! repeated safely and go through [`RetryPolicy::read()`]. Transaction
//! submission never does. Only transport errors reach the policy: any HTTP
//! response, whatever its status, is final.

use std::future::Future;
use std::time::Duration;

/// How often and how patiently a read is repeated after a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    /// Wait before the first retry. Doubles for each later one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries after 200, 400 and 800 ms.
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A single attempt.
    pub fn once() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before retry `n`, counting from zero.
    pub fn delay(&self, n: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << n.min(16))
    }

    /// Run `call` until it succeeds or the retries are spent.
    pub(crate) async fn read<T, E, F, Fut>(&self, endpoint: &str, mut call: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retry = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.retries => {
                    let wait = self.delay(retry);
                    retry += 1;
                    tracing::warn!(
                        endpoint,
                        retry,
                        of = self.retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "ledger read failed; backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
