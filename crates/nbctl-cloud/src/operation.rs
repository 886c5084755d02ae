//! Long-running operations
//!
//! A mutating cloud call that does not complete synchronously hands back a
//! [`LongRunningOperation`]. The handle is owned by whoever submitted it and
//! is resolved by polling until a terminal state shows up. Nothing here ever
//! resubmits the original request.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::error::CloudError;

/// Handle to a submitted operation
///
/// Deliberately not `Clone`: polling consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct LongRunningOperation {
    /// Human readable description, e.g. `create storage account foo`
    pub operation: String,
    /// Resource the operation acts on
    pub resource: String,
    /// Status URL; `None` when the submit call already completed
    pub poll_url: Option<String>,
    /// Provider-suggested delay before the first poll
    pub retry_after: Option<Duration>,
}

impl LongRunningOperation {
    pub fn pending(
        operation: impl Into<String>,
        resource: impl Into<String>,
        poll_url: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self {
            operation: operation.into(),
            resource: resource.into(),
            poll_url: Some(poll_url.into()),
            retry_after,
        }
    }

    pub fn completed(operation: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            resource: resource.into(),
            poll_url: None,
            retry_after: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.poll_url.is_none()
    }
}

/// State observed by one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState<T> {
    InProgress { retry_after: Option<Duration> },
    Succeeded(T),
    Failed(String),
    Canceled,
}

impl<T> OperationState<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::InProgress { .. })
    }
}

/// Polling cadence for long-running operations
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Used when the provider gives no `Retry-After`
    pub interval: Duration,

    /// Upper clamp for provider-suggested delays
    pub max_interval: Duration,

    /// `None` polls forever
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            timeout: Some(Duration::from_secs(30 * 60)),
        }
    }
}

impl PollConfig {
    fn delay(&self, suggested: Option<Duration>) -> Duration {
        suggested.unwrap_or(self.interval).min(self.max_interval)
    }
}

/// One status query against the provider
#[async_trait]
pub trait OperationPoller: Send + Sync {
    type Output: Send;
    type Error: From<CloudError> + Send;

    async fn poll_once(
        &self,
        op: &LongRunningOperation,
    ) -> Result<OperationState<Self::Output>, Self::Error>;
}

/// Poll `op` until it reaches a terminal state
///
/// `Failed` and `Canceled` become [`CloudError::AsyncOperationFailed`] with
/// the provider's detail. Errors from the poll call itself are returned as
/// they are; the operation keeps running on the provider side.
pub async fn poll_until_done<P>(
    poller: &P,
    op: LongRunningOperation,
    config: &PollConfig,
) -> Result<P::Output, P::Error>
where
    P: OperationPoller + ?Sized,
{
    let started = Instant::now();
    let mut delay = if op.is_completed() {
        Duration::ZERO
    } else {
        config.delay(op.retry_after)
    };
    let mut polls = 0u32;

    loop {
        if !delay.is_zero() {
            sleep(delay).await;
        }
        polls += 1;
        tracing::debug!(operation = %op.operation, polls, "polling operation");

        match poller.poll_once(&op).await? {
            OperationState::Succeeded(output) => {
                tracing::info!(operation = %op.operation, polls, "operation succeeded");
                return Ok(output);
            }
            OperationState::Failed(detail) => {
                return Err(CloudError::AsyncOperationFailed {
                    operation: op.operation,
                    detail,
                }
                .into());
            }
            OperationState::Canceled => {
                return Err(CloudError::AsyncOperationFailed {
                    operation: op.operation,
                    detail: "operation was canceled".to_string(),
                }
                .into());
            }
            OperationState::InProgress { retry_after } => {
                delay = config.delay(retry_after);
            }
        }

        if let Some(timeout) = config.timeout {
            let waited = started.elapsed();
            if waited + delay > timeout {
                return Err(CloudError::OperationTimeout {
                    operation: op.operation,
                    waited,
                }
                .into());
            }
        }
    }
}
