// storefront/src/services/notifications/retry.rs

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::NotificationError;
use crate::config::NotificationConfig;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
  /// Total attempts, the first one included
  pub max_attempts: u32,
  pub initial_delay: Duration,
  pub max_delay: Duration,
  /// Factor to multiply delay by after each attempt
  pub backoff_factor: f64,
  /// Upper bound for a single attempt
  pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_delay: Duration::from_millis(200),
      max_delay: Duration::from_secs(5),
      backoff_factor: 2.0,
      attempt_timeout: Duration::from_secs(5),
    }
  }
}

impl From<&NotificationConfig> for RetryConfig {
  fn from(cfg: &NotificationConfig) -> Self {
    Self {
      max_attempts: cfg.max_attempts.max(1),
      initial_delay: cfg.initial_backoff,
      attempt_timeout: cfg.attempt_timeout,
      ..Self::default()
    }
  }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. Every attempt is bounded by `attempt_timeout`.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, channel: &str, mut operation: F) -> Result<T, NotificationError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, NotificationError>>,
{
  let mut delay = config.initial_delay;
  let mut attempts = 0;

  loop {
    attempts += 1;

    let outcome = match timeout(config.attempt_timeout, operation()).await {
      Ok(result) => result,
      Err(_) => Err(NotificationError::TimedOut(config.attempt_timeout)),
    };

    match outcome {
      Ok(result) => {
        if attempts > 1 {
          debug!(channel, attempts, "Delivery succeeded after retries");
        }
        return Ok(result);
      }
      Err(error) => {
        if attempts >= config.max_attempts || !error.is_retryable() {
          warn!(channel, attempts, %error, "Delivery failed");
          return Err(error);
        }

        warn!(channel, attempts, %error, retry_in = ?delay, "Delivery attempt failed, retrying");
        sleep(delay).await;

        delay = Duration::from_secs_f64((delay.as_secs_f64() * config.backoff_factor).min(config.max_delay.as_secs_f64()));
      }
    }
  }
}
