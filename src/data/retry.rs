use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use log::warn;

use crate::config::EASTMONEY;

/// Exponential backoff parameters for a provider call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_multiplier,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: EASTMONEY.client.max_attempts,
            base_delay: Duration::from_millis(EASTMONEY.client.base_delay_ms),
            backoff_multiplier: EASTMONEY.client.backoff_multiplier,
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between failures
/// with the delay multiplied after each attempt. The last error is returned
/// once the cap is hit; callers that prefer empty results map it themselves.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, context: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut last_err = anyhow::anyhow!("no attempts made");

    for attempt in 1..=policy.max_attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt < policy.max_attempts {
                    warn!(
                        "[retry] {context}: attempt {attempt}/{} failed ({err:#}), next in {:.1}s",
                        policy.max_attempts,
                        delay.as_secs_f64(),
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(policy.backoff_multiplier);
                } else {
                    warn!(
                        "[retry] {context}: giving up after {} attempts ({err:#})",
                        policy.max_attempts,
                    );
                }
                last_err = err;
            }
        }
    }

    Err(last_err)
}
