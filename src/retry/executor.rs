// Retry loop for fallible workflow operations
// Failures are logged, classified, and either retried with backoff or returned

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tracing::debug;

use super::errors::{ErrorKind, WorkflowError};
use super::policy::RetryPolicy;
use crate::observer::{SharedObserver, TracingObserver, WorkflowEvent};
use crate::workflows::WorkflowContext;

/// One failed attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogEntry {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based attempt number
    pub attempt: u32,
    pub context: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

pub struct RetryExecutor {
    policy: RetryPolicy,
    error_log: Vec<ErrorLogEntry>,
    observer: SharedObserver,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            error_log: Vec::new(),
            observer: TracingObserver::shared(),
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Every failure seen by this executor, oldest first
    pub fn error_log(&self) -> &[ErrorLogEntry] {
        &self.error_log
    }

    /// Run `operation` until it succeeds, fails with an error that should not
    /// be retried, or runs out of attempts.
    ///
    /// The last error is returned to the caller. Errors that are not already a
    /// [`WorkflowError`] are converted through `Into`, which classifies
    /// unrecognised failures as [`ErrorKind::Unknown`].
    pub async fn execute_with_retry<F, Fut, T, E>(
        &mut self,
        mut operation: F,
        context: &WorkflowContext,
    ) -> Result<T, WorkflowError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<WorkflowError>,
    {
        // A zero-attempt policy still runs the operation once
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            self.observer.on_event(&WorkflowEvent::AttemptStarted {
                attempt: attempt + 1,
                max_attempts,
            });

            let error: WorkflowError = match operation().await {
                Ok(result) => {
                    self.observer.on_event(&WorkflowEvent::OperationSucceeded {
                        attempts: attempt + 1,
                    });
                    return Ok(result);
                }
                Err(error) => error.into(),
            };

            self.log_error(&error, context, attempt + 1);

            if attempt + 1 >= max_attempts || !error.should_retry() {
                debug!(
                    kind = %error.kind(),
                    attempts = attempt + 1,
                    "Giving up on operation"
                );
                return Err(error);
            }

            let delay = self.policy.delay(attempt);
            self.observer.on_event(&WorkflowEvent::RetryScheduled {
                attempt: attempt + 1,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            });
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn log_error(&mut self, error: &WorkflowError, context: &WorkflowContext, attempt: u32) {
        self.error_log.push(ErrorLogEntry {
            kind: error.kind(),
            message: error.message().to_string(),
            attempt,
            context: context.snapshot(),
            timestamp: Utc::now(),
        });
        self.observer.on_event(&WorkflowEvent::AttemptFailed {
            kind: error.kind(),
            message: error.message().to_string(),
            attempt,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn executor(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        })
        .with_observer(RecordingObserver::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failure() {
        let mut executor = executor(3);
        let calls = AtomicU32::new(0);
        let context: WorkflowContext = [("workflow_id", "wf_error_001")].into_iter().collect();

        let result = executor
            .execute_with_retry(
                || {
                    let count = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if count < 2 {
                            Err(WorkflowError::network("connection reset"))
                        } else {
                            Ok("success")
                        }
                    }
                },
                &context,
            )
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(executor.error_log().len(), 2);
        assert_eq!(executor.error_log()[0].attempt, 1);
        assert_eq!(executor.error_log()[1].attempt, 2);
        assert_eq!(
            executor.error_log()[0].context,
            serde_json::json!({"workflow_id": "wf_error_001"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error() {
        let mut executor = executor(5);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(WorkflowError::validation("amount missing")) }
                },
                &WorkflowContext::new(),
            )
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(executor.error_log().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let mut executor = executor(3);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute_with_retry(
                || {
                    let count = calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(WorkflowError::timeout(format!("attempt {}", count + 1))) }
                },
                &WorkflowContext::new(),
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.message(), "attempt 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(executor.error_log().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassified_errors_stop_immediately() {
        let mut executor = executor(3);

        let result: Result<(), WorkflowError> = executor
            .execute_with_retry(
                || async { Err(anyhow::anyhow!("unexpected payload")) },
                &WorkflowContext::new(),
            )
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(executor.error_log().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempt_policy_runs_once() {
        let mut executor = executor(0);
        let calls = AtomicU32::new(0);

        let result = executor
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, WorkflowError>(42) }
                },
                &WorkflowContext::new(),
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
