//! Retry and failure handling around a sink

use backon::{BlockingRetryable, ExponentialBuilder};
use breach_core::{FailurePolicy, ImportConfig, Statement};
use std::time::Duration;
use tracing::warn;

use crate::error::SinkError;
use crate::sink::{ExecutionSink, Progress};

/// How hard to try before a batch counts as failed, and what happens then
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    pub on_failure: FailurePolicy,
    /// Extra attempts after the first one
    pub retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::Abort,
            retries: 0,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl DeliveryPolicy {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            on_failure: config.on_error,
            retries: config.retries,
            min_delay: Duration::from_millis(config.retry_delay_ms),
            ..Default::default()
        }
    }
}

/// Deliver one statement, retrying retryable failures with exponential backoff
pub fn deliver_with_retry<S>(
    sink: &mut S,
    statement: &Statement,
    progress: &Progress,
    policy: &DeliveryPolicy,
) -> Result<(), SinkError>
where
    S: ExecutionSink + ?Sized,
{
    if policy.retries == 0 {
        return sink.deliver(statement, progress);
    }

    let attempt = || sink.deliver(statement, progress);
    attempt
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(policy.min_delay)
                .with_max_delay(policy.max_delay)
                .with_max_times(policy.retries as usize),
        )
        .sleep(std::thread::sleep)
        .when(SinkError::is_retryable)
        .notify(|err, dur| {
            warn!(
                batch = progress.batch_index,
                "delivery failed, retrying in {:?}: {}", dur, err
            );
        })
        .call()
}
