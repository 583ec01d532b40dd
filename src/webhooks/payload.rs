use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::{WorkflowContext, WorkflowState};

/// Event names sent to webhook receivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "workflow.started")]
    Started,
    #[serde(rename = "workflow.approved")]
    Approved,
    #[serde(rename = "workflow.rejected")]
    Rejected,
    #[serde(rename = "workflow.completed")]
    Completed,
    #[serde(rename = "workflow.error")]
    Error,
}

impl WebhookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEvent::Started => "workflow.started",
            WebhookEvent::Approved => "workflow.approved",
            WebhookEvent::Rejected => "workflow.rejected",
            WebhookEvent::Completed => "workflow.completed",
            WebhookEvent::Error => "workflow.error",
        }
    }

    /// Event raised when a workflow enters `state`. Returning to `pending`
    /// raises nothing.
    pub fn for_state(state: WorkflowState) -> Option<Self> {
        match state {
            WorkflowState::Pending => None,
            WorkflowState::InProgress => Some(WebhookEvent::Started),
            WorkflowState::Approved => Some(WebhookEvent::Approved),
            WorkflowState::Rejected => Some(WebhookEvent::Rejected),
            WorkflowState::Completed => Some(WebhookEvent::Completed),
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a webhook POST. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    event: WebhookEvent,
    workflow_id: String,
    state: WorkflowState,
    context: serde_json::Value,
    /// Unix epoch seconds
    timestamp: f64,
}

impl WebhookPayload {
    pub fn new(
        event: WebhookEvent,
        workflow_id: impl Into<String>,
        state: WorkflowState,
        context: &WorkflowContext,
    ) -> Self {
        Self::with_timestamp(event, workflow_id, state, context, unix_timestamp())
    }

    pub fn with_timestamp(
        event: WebhookEvent,
        workflow_id: impl Into<String>,
        state: WorkflowState,
        context: &WorkflowContext,
        timestamp: f64,
    ) -> Self {
        Self {
            event,
            workflow_id: workflow_id.into(),
            state,
            context: context.snapshot(),
            timestamp,
        }
    }

    pub fn event(&self) -> WebhookEvent {
        self.event
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
