// FastLease Workflow Library - lease application state machine, retries and webhooks
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod drivers;
pub mod observer;
pub mod retry;
pub mod telemetry;
pub mod webhooks;
pub mod workflows;

// Re-export key types for easy access
pub use config::FastLeaseConfig;
pub use drivers::{RetryingWorkflow, RiskyOperation, Step, WebhookWorkflow};
pub use observer::{
    RecordingObserver, RefusalReason, SharedObserver, TracingObserver, WorkflowEvent,
    WorkflowObserver,
};
pub use retry::{ErrorKind, ErrorLogEntry, RetryExecutor, RetryPolicy, WorkflowError};
pub use telemetry::{create_workflow_span, generate_correlation_id, generate_workflow_id, init_telemetry};
pub use webhooks::{
    HttpTransport, NotificationDispatcher, WebhookEvent, WebhookPayload, WebhookTransport,
};
pub use workflows::{
    Registry, StateMachine, TransitionRecord, TransitionTable, WorkflowContext, WorkflowState,
};
