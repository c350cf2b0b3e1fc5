use std::thread;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::{HttpClient, TransportError};

/// Bounded exponential backoff.
///
/// The wait after failed attempt `n` (1-based) is
/// `multiplier * 2^(n-1)`, clamped to `[min_wait, max_wait]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget as the default, with no waiting between attempts.
    pub fn without_backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(factor)
            .max(self.min_wait)
            .min(self.max_wait)
    }
}

/// An [`HttpClient`] wrapper that retries transient failures of `inner`.
///
/// Non-transient errors are returned on the first failure. Once
/// `max_attempts` is used up the last error is returned. The calling thread
/// sleeps through each backoff.
pub struct RetryingClient<C> {
    pub inner: C,
    pub policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<C: HttpClient> HttpClient for RetryingClient<C> {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let mut attempt = 1;
        loop {
            let err = match self.inner.get_json(url) {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            let transient = err.is_transient();
            warn!(
                url = %url,
                attempt,
                max_attempts = self.policy.max_attempts,
                transient,
                error = %err,
                "API request failed"
            );

            if !transient || attempt >= self.policy.max_attempts {
                return Err(err);
            }

            let wait = self.policy.delay(attempt);
            debug!(wait_ms = wait.as_millis() as u64, "Backing off before retry");
            thread::sleep(wait);
            attempt += 1;
        }
    }
}
