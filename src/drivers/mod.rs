// Workflows that wire the state machine to retries and webhook delivery

pub mod retrying_workflow;
pub mod simulation;
pub mod webhook_workflow;

pub use retrying_workflow::RetryingWorkflow;
pub use simulation::RiskyOperation;
pub use webhook_workflow::{Step, WebhookWorkflow};
