//! Bounded retry with exponential backoff for remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::RemoteCacheError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one. At least 1.
  pub max_attempts: u32,
  pub initial_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_delay: Duration::from_millis(500),
      max_delay: Duration::from_secs(8),
    }
  }
}

impl RetryPolicy {
  /// A single attempt, no retries.
  pub fn none() -> Self {
    Self {
      max_attempts: 1,
      ..Self::default()
    }
  }

  /// Delay before retry number `attempt` (1-based).
  pub fn backoff(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.initial_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Run `operation` until it succeeds, fails permanently, or attempts run out.
  ///
  /// Only errors for which [`RemoteCacheError::is_transient`] holds are retried.
  pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, RemoteCacheError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteCacheError>>,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match f().await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_transient() && attempt < max_attempts => {
          let delay = self.backoff(attempt);
          warn!(operation, attempt, error = %e, delay_ms = delay.as_millis() as u64, "transient remote failure, retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
