//! Readiness polling
//!
//! Re-evaluates a predicate at a fixed interval until it holds or the bound
//! expires. A predicate error counts as "not ready yet".

use crate::error::{BoxError, DeployError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Interval and upper bound of a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

/// Block until `predicate` returns `Ok(true)`
///
/// Returns the number of evaluations it took. The timeout is checked after
/// each evaluation, so it never fires before the bound has fully elapsed. An
/// evaluation still running when the bound expires is abandoned.
pub async fn wait_until<F, Fut>(policy: &PollPolicy, what: &str, mut predicate: F) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<bool, BoxError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let evaluation = match policy.timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(started.elapsed());
                match tokio::time::timeout(remaining, predicate()).await {
                    Ok(result) => result,
                    Err(_) => Err("readiness check did not complete in time".into()),
                }
            }
            None => predicate().await,
        };

        match evaluation {
            Ok(true) => {
                tracing::debug!(what, attempts, "ready");
                return Ok(attempts);
            }
            Ok(false) => {
                tracing::debug!(what, attempts, "not ready yet");
            }
            Err(e) => {
                tracing::warn!(what, attempts, error = %e, "readiness check failed, will retry");
            }
        }

        if let Some(timeout) = policy.timeout {
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(DeployError::ReadinessTimeout {
                    what: what.to_string(),
                    waited,
                });
            }
        }

        sleep(policy.interval).await;
    }
}
