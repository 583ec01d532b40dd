// Built-in transition actions. Each one reports through the observer only.

use super::context::WorkflowContext;
use super::state::WorkflowState;
use crate::observer::{WorkflowEvent, WorkflowObserver};

pub const ANNOUNCE: &str = "announce";
pub const LOG_TRANSITION: &str = "log_transition";
pub const NOTIFY_USER: &str = "notify_user";
pub const RECORD_STATE: &str = "record_state";

/// Everything an action may look at or touch while a transition is in flight.
/// `context` is still the pre-commit context; the state has not changed yet.
pub struct ActionContext<'a> {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub context: &'a mut WorkflowContext,
    pub observer: &'a dyn WorkflowObserver,
}

impl ActionContext<'_> {
    pub fn emit(&self, event: WorkflowEvent) {
        self.observer.on_event(&event);
    }
}

pub fn announce(ctx: &mut ActionContext<'_>) {
    ctx.emit(WorkflowEvent::StageEntered {
        stage: ctx.to,
        from: ctx.from,
    });
}

pub fn log_transition(ctx: &mut ActionContext<'_>) {
    ctx.emit(WorkflowEvent::TransitionLogged {
        from: ctx.from,
        to: ctx.to,
        context: ctx.context.snapshot(),
    });
}

pub fn notify_user(ctx: &mut ActionContext<'_>) {
    let recipient = ctx.context.get_str("user_id").unwrap_or("unknown").to_string();
    ctx.emit(WorkflowEvent::UserNotified {
        recipient,
        message: notification_message(ctx.to).to_string(),
    });
}

pub fn record_state(ctx: &mut ActionContext<'_>) {
    let workflow_id = ctx
        .context
        .get_str("workflow_id")
        .unwrap_or("unknown")
        .to_string();
    ctx.emit(WorkflowEvent::StateRecorded {
        workflow_id,
        state: ctx.to,
    });
}

fn notification_message(target: WorkflowState) -> &'static str {
    match target {
        WorkflowState::Pending => "Returned to pending",
        WorkflowState::InProgress => "Processing started",
        WorkflowState::Approved => "Approved",
        WorkflowState::Rejected => "Rejected",
        WorkflowState::Completed => "Completed",
    }
}
