// Structured workflow events and the sinks that receive them.
// Components never print; they report to an injected observer.

use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::retry::ErrorKind;
use crate::workflows::WorkflowState;

/// Why a transition request was turned down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefusalReason {
    /// The target is not an allowed successor of the current state
    NotPermitted,
    /// A guard on the transition returned false
    GuardFailed { guard: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    // State machine
    TransitionRefused {
        from: WorkflowState,
        to: WorkflowState,
        reason: RefusalReason,
    },
    TransitionCommitted {
        from: WorkflowState,
        to: WorkflowState,
    },
    StageEntered {
        stage: WorkflowState,
        from: WorkflowState,
    },
    TransitionLogged {
        from: WorkflowState,
        to: WorkflowState,
        context: serde_json::Value,
    },
    UserNotified {
        recipient: String,
        message: String,
    },
    StateRecorded {
        workflow_id: String,
        state: WorkflowState,
    },

    // Retry executor
    AttemptStarted {
        attempt: u32,
        max_attempts: u32,
    },
    AttemptFailed {
        kind: ErrorKind,
        message: String,
        attempt: u32,
    },
    RetryScheduled {
        attempt: u32,
        delay_ms: u64,
    },
    OperationSucceeded {
        attempts: u32,
    },

    // Webhook dispatch
    WebhookDelivered {
        endpoint: String,
        status: u16,
    },
    WebhookRejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    WebhookTransportFailed {
        endpoint: String,
        attempt: u32,
        error: String,
    },
}

/// Sink for workflow events
pub trait WorkflowObserver: Send + Sync {
    fn on_event(&self, event: &WorkflowEvent);
}

pub type SharedObserver = Arc<dyn WorkflowObserver>;

/// Forwards every event to `tracing` with structured fields
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn shared() -> SharedObserver {
        Arc::new(TracingObserver)
    }
}

impl WorkflowObserver for TracingObserver {
    fn on_event(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::TransitionRefused { from, to, reason } => match reason {
                RefusalReason::NotPermitted => {
                    debug!(%from, %to, "Transition not permitted")
                }
                RefusalReason::GuardFailed { guard } => {
                    info!(%from, %to, guard = %guard, "Transition blocked by guard")
                }
            },
            WorkflowEvent::TransitionCommitted { from, to } => {
                info!(%from, %to, "Workflow transitioned")
            }
            WorkflowEvent::StageEntered { stage, from } => {
                info!(stage = %stage, from = %from, "Workflow entering stage")
            }
            WorkflowEvent::TransitionLogged { from, to, context } => {
                info!(%from, %to, context = %context, "Transition context")
            }
            WorkflowEvent::UserNotified { recipient, message } => {
                info!(recipient = %recipient, message = %message, "Notification sent")
            }
            WorkflowEvent::StateRecorded { workflow_id, state } => {
                info!(workflow_id = %workflow_id, state = %state, "Workflow state recorded")
            }
            WorkflowEvent::AttemptStarted {
                attempt,
                max_attempts,
            } => debug!(attempt, max_attempts, "Starting attempt"),
            WorkflowEvent::AttemptFailed {
                kind,
                message,
                attempt,
            } => warn!(kind = %kind, attempt, "Attempt failed: {}", message),
            WorkflowEvent::RetryScheduled { attempt, delay_ms } => {
                debug!(attempt, delay_ms, "Retry scheduled")
            }
            WorkflowEvent::OperationSucceeded { attempts } => {
                info!(attempts, "Operation succeeded")
            }
            WorkflowEvent::WebhookDelivered { endpoint, status } => {
                info!(endpoint = %endpoint, status, "Webhook delivered")
            }
            WorkflowEvent::WebhookRejected {
                endpoint,
                status,
                body,
            } => warn!(endpoint = %endpoint, status, body = %body, "Webhook rejected"),
            WorkflowEvent::WebhookTransportFailed {
                endpoint,
                attempt,
                error,
            } => warn!(endpoint = %endpoint, attempt, "Webhook transport failed: {}", error),
        }
    }
}

/// Keeps every event in memory so tests can assert on them
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, predicate: impl Fn(&WorkflowEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|e| predicate(e)).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl WorkflowObserver for RecordingObserver {
    fn on_event(&self, event: &WorkflowEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
