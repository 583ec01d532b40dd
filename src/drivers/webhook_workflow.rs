use tracing::{info, warn};

use crate::webhooks::{NotificationDispatcher, WebhookEvent, WebhookPayload};
use crate::workflows::{StateMachine, WorkflowContext, WorkflowState};

/// Result of asking the workflow to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine turned the transition down; nothing was sent
    Refused,
    /// The transition was committed. `delivered` is `None` when the new
    /// state raises no webhook event.
    Transitioned { delivered: Option<bool> },
}

impl Step {
    pub fn is_transitioned(self) -> bool {
        matches!(self, Step::Transitioned { .. })
    }
}

/// A workflow that reports every committed transition to webhook receivers
pub struct WebhookWorkflow {
    workflow_id: String,
    machine: StateMachine,
    dispatcher: NotificationDispatcher,
    event_history: Vec<WebhookPayload>,
}

impl WebhookWorkflow {
    pub fn new(
        workflow_id: impl Into<String>,
        mut machine: StateMachine,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let workflow_id = workflow_id.into();
        machine
            .context_mut()
            .insert("workflow_id", workflow_id.clone());
        Self {
            workflow_id,
            machine,
            dispatcher,
            event_history: Vec::new(),
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.current_state()
    }

    pub fn context(&self) -> &WorkflowContext {
        self.machine.context()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Every event raised so far, delivered or not
    pub fn event_history(&self) -> &[WebhookPayload] {
        &self.event_history
    }

    pub async fn start_processing(&mut self) -> Step {
        self.advance(WorkflowState::InProgress).await
    }

    pub async fn approve(&mut self) -> Step {
        self.advance(WorkflowState::Approved).await
    }

    pub async fn complete(&mut self) -> Step {
        self.advance(WorkflowState::Completed).await
    }

    /// Reject with a reason that travels in the context of the webhook.
    /// The reason is withdrawn again if the rejection is refused.
    pub async fn reject(&mut self, reason: &str) -> Step {
        let previous = self.machine.context_mut().insert("rejection_reason", reason);
        let step = self.advance(WorkflowState::Rejected).await;
        if step == Step::Refused {
            match previous {
                Some(value) => self.machine.context_mut().insert("rejection_reason", value),
                None => self.machine.context_mut().remove("rejection_reason"),
            };
        }
        step
    }

    /// Record an error and raise `workflow.error` without changing state
    pub async fn handle_error(&mut self, error: &str) -> bool {
        self.machine.context_mut().insert("error", error);
        warn!(workflow_id = %self.workflow_id, error = %error, "Workflow error raised");
        self.raise(WebhookEvent::Error).await
    }

    /// Transition the machine, then raise the event for the new state
    pub async fn advance(&mut self, target: WorkflowState) -> Step {
        if !self.machine.transition(target) {
            return Step::Refused;
        }

        let delivered = match WebhookEvent::for_state(target) {
            Some(event) => Some(self.raise(event).await),
            None => None,
        };
        Step::Transitioned { delivered }
    }

    // The payload joins the history before dispatch, whatever the outcome
    async fn raise(&mut self, event: WebhookEvent) -> bool {
        let payload = WebhookPayload::new(
            event,
            self.workflow_id.clone(),
            self.machine.current_state(),
            self.machine.context(),
        );
        self.event_history.push(payload.clone());

        let delivered = self.dispatcher.send(&payload).await;
        if delivered {
            info!(workflow_id = %self.workflow_id, event = %event, "Webhook sent");
        } else {
            warn!(workflow_id = %self.workflow_id, event = %event, "Webhook not delivered");
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::webhooks::{TransportError, TransportResponse, WebhookTransport};
    use crate::workflows::TransitionTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Answers 200 or refuses the connection depending on a switch
    struct SwitchTransport {
        up: AtomicBool,
    }

    #[async_trait]
    impl WebhookTransport for SwitchTransport {
        async fn post_json(
            &self,
            endpoint: &str,
            _body: &str,
        ) -> Result<TransportResponse, TransportError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(TransportResponse {
                    status: 200,
                    body: "ok".to_string(),
                })
            } else {
                Err(TransportError::Connection {
                    endpoint: endpoint.to_string(),
                    message: "down".to_string(),
                })
            }
        }
    }

    fn workflow(up: bool) -> (WebhookWorkflow, Arc<SwitchTransport>) {
        let observer = RecordingObserver::new();
        let transport = Arc::new(SwitchTransport {
            up: AtomicBool::new(up),
        });
        let machine = StateMachine::builder()
            .table(TransitionTable::standard())
            .observer(observer.clone())
            .build()
            .unwrap();
        let dispatcher =
            NotificationDispatcher::new(vec!["http://receiver".to_string()], transport.clone())
                .with_observer(observer);
        (WebhookWorkflow::new("wf_webhook_001", machine, dispatcher), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_lifecycle_raises_three_events() {
        let (mut workflow, _) = workflow(true);

        assert_eq!(
            workflow.start_processing().await,
            Step::Transitioned { delivered: Some(true) }
        );
        assert!(workflow.approve().await.is_transitioned());
        assert!(workflow.complete().await.is_transitioned());

        let events: Vec<_> = workflow.event_history().iter().map(|p| p.event()).collect();
        assert_eq!(
            events,
            vec![WebhookEvent::Started, WebhookEvent::Approved, WebhookEvent::Completed]
        );
        assert_eq!(workflow.event_history()[2].state(), WorkflowState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_records_undelivered_events() {
        let (mut workflow, _) = workflow(false);

        assert_eq!(
            workflow.start_processing().await,
            Step::Transitioned { delivered: Some(false) }
        );
        assert_eq!(workflow.event_history().len(), 1);
        assert_eq!(workflow.state(), WorkflowState::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_carries_reason() {
        let (mut workflow, _) = workflow(true);
        workflow.start_processing().await;

        assert!(workflow.reject("credit check failed").await.is_transitioned());

        let last = workflow.event_history().last().unwrap();
        assert_eq!(last.event(), WebhookEvent::Rejected);
        assert_eq!(last.context()["rejection_reason"], "credit check failed");
        assert_eq!(last.context()["workflow_id"], "wf_webhook_001");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_steps_send_nothing() {
        let (mut workflow, _) = workflow(true);

        assert_eq!(workflow.complete().await, Step::Refused);
        workflow.start_processing().await;
        workflow.reject("no").await;
        assert_eq!(workflow.reject("again").await, Step::Refused);

        assert_eq!(workflow.event_history().len(), 2);
        assert_eq!(workflow.context().get_str("rejection_reason"), Some("no"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_event_keeps_state() {
        let (mut workflow, transport) = workflow(true);
        workflow.start_processing().await;
        transport.up.store(false, Ordering::SeqCst);

        assert!(!workflow.handle_error("bank API unavailable").await);

        let last = workflow.event_history().last().unwrap();
        assert_eq!(last.event(), WebhookEvent::Error);
        assert_eq!(last.state(), WorkflowState::InProgress);
        assert_eq!(last.context()["error"], "bank API unavailable");
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_pending_raises_no_event() {
        let (mut workflow, _) = workflow(true);
        workflow.start_processing().await;

        assert_eq!(
            workflow.advance(WorkflowState::Pending).await,
            Step::Transitioned { delivered: None }
        );
        assert_eq!(workflow.event_history().len(), 1);
    }
}
