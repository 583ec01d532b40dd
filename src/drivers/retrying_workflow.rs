use std::future::Future;
use tracing::{info, warn};

use crate::retry::{RetryExecutor, WorkflowError};
use crate::workflows::{StateMachine, WorkflowState};

/// Runs one risky operation under the retry executor and maps the outcome
/// onto the state machine: success ends in `completed`, failure in `rejected`.
pub struct RetryingWorkflow {
    machine: StateMachine,
    executor: RetryExecutor,
}

impl RetryingWorkflow {
    pub fn new(machine: StateMachine, executor: RetryExecutor) -> Self {
        Self { machine, executor }
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.current_state()
    }

    /// Start the workflow, run `operation` with retries and settle the state.
    ///
    /// The operation's last error is returned unchanged. A refused approval
    /// after a successful operation rejects the workflow with a validation
    /// error.
    pub async fn process_with_retry<F, Fut, T, E>(&mut self, operation: F) -> Result<T, WorkflowError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<WorkflowError>,
    {
        if !self.machine.transition(WorkflowState::InProgress) {
            return Err(WorkflowError::validation(format!(
                "workflow cannot start from state {}",
                self.machine.current_state()
            )));
        }

        match self
            .executor
            .execute_with_retry(operation, self.machine.context())
            .await
        {
            Ok(result) => {
                if self.machine.transition(WorkflowState::Approved)
                    && self.machine.transition(WorkflowState::Completed)
                {
                    info!(
                        attempts = self.executor.error_log().len() + 1,
                        "Workflow completed"
                    );
                    return Ok(result);
                }
                let error = WorkflowError::validation(format!(
                    "approval refused in state {}",
                    self.machine.current_state()
                ));
                self.fail(&error);
                Err(error)
            }
            Err(error) => {
                self.fail(&error);
                Err(error)
            }
        }
    }

    fn fail(&mut self, error: &WorkflowError) {
        self.machine.context_mut().insert("error", error.to_string());
        if !self.machine.transition(WorkflowState::Rejected) {
            warn!(
                state = %self.machine.current_state(),
                "Failed workflow could not be rejected"
            );
        }
    }
}
