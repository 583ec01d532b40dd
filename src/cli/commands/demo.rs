use anyhow::{Context, Result};
use tracing::Instrument;

use super::{print_history, print_step};
use crate::config::FastLeaseConfig;
use crate::drivers::{RetryingWorkflow, RiskyOperation, Step, WebhookWorkflow};
use crate::retry::RetryExecutor;
use crate::telemetry::{create_workflow_span, generate_correlation_id, generate_workflow_id};
use crate::webhooks::NotificationDispatcher;
use crate::workflows::{StateMachine, TransitionTable, WorkflowContext, WorkflowState};

const HAPPY_PATH: [WorkflowState; 3] = [
    WorkflowState::InProgress,
    WorkflowState::Approved,
    WorkflowState::Completed,
];

/// Standard table, no guards
pub struct BasicDemo;

impl BasicDemo {
    pub fn execute(&self) -> Result<()> {
        println!("🚀 Basic workflow");
        println!();

        let mut machine = StateMachine::builder().build()?;
        for target in HAPPY_PATH {
            let committed = machine.transition(target);
            print_step(target, committed);
        }

        // Terminal states accept nothing
        let committed = machine.transition(WorkflowState::InProgress);
        print_step(WorkflowState::InProgress, committed);

        println!();
        print_history(&machine);
        Ok(())
    }
}

pub struct GuardedDemo {
    pub user_id: String,
    pub amount: f64,
    pub role: String,
    pub workflow_id: Option<String>,
}

impl GuardedDemo {
    pub fn execute(&self, config: &FastLeaseConfig) -> Result<()> {
        let workflow_id = self
            .workflow_id
            .clone()
            .unwrap_or_else(|| generate_workflow_id(&config.workflow.id_prefix));
        let span = create_workflow_span(&workflow_id, &generate_correlation_id());
        let _entered = span.enter();

        println!("🚀 Guarded workflow {}", workflow_id);
        println!(
            "   user: {}  role: {}  amount: {}",
            self.user_id, self.role, self.amount
        );
        println!();

        let context: WorkflowContext = [
            ("workflow_id", serde_json::json!(workflow_id)),
            ("user_id", serde_json::json!(self.user_id)),
            ("amount", serde_json::json!(self.amount)),
            ("user_role", serde_json::json!(self.role)),
        ]
        .into_iter()
        .collect();

        let mut machine = StateMachine::builder()
            .table(TransitionTable::guarded())
            .context(context)
            .build()?;

        for target in HAPPY_PATH {
            let committed = machine.transition(target);
            print_step(target, committed);
            if !committed {
                break;
            }
        }

        println!();
        print_history(&machine);
        Ok(())
    }
}

pub struct RetryDemo {
    pub failure_rate: f64,
    pub seed: Option<u64>,
    pub max_attempts: Option<u32>,
}

impl RetryDemo {
    pub async fn execute(&self, config: &FastLeaseConfig) -> Result<()> {
        let mut policy = config.retry.to_policy();
        if let Some(max_attempts) = self.max_attempts {
            policy.max_attempts = max_attempts;
        }
        policy.validate()?;

        let workflow_id = generate_workflow_id(&config.workflow.id_prefix);
        let mut operation = match self.seed {
            Some(seed) => RiskyOperation::seeded(seed, self.failure_rate)?,
            None => RiskyOperation::new(self.failure_rate)?,
        };

        println!(
            "🚀 Retrying workflow {} (failure rate {:.0}%, {} attempts)",
            workflow_id,
            operation.failure_rate() * 100.0,
            policy.max_attempts
        );
        println!();

        let mut context = WorkflowContext::new();
        context.insert("workflow_id", workflow_id.clone());
        let machine = StateMachine::builder().context(context).build()?;
        let mut workflow = RetryingWorkflow::new(machine, RetryExecutor::new(policy));

        let span = create_workflow_span(&workflow_id, &generate_correlation_id());
        let outcome = workflow
            .process_with_retry(|| {
                let result = operation.attempt();
                async move { result }
            })
            .instrument(span)
            .await;

        match outcome {
            Ok(result) => println!("✅ Result: {}", result),
            Err(e) => println!("❌ Workflow failed: {}", e),
        }
        println!("🏁 Final state: {}", workflow.state());
        println!();

        let log = workflow.executor().error_log();
        println!("📜 Error log: {} entries", log.len());
        for entry in log {
            println!(
                "   - {} on attempt {}: {}",
                entry.kind, entry.attempt, entry.message
            );
        }
        Ok(())
    }
}

pub struct WebhookDemo {
    pub endpoints: Vec<String>,
    pub workflow_id: Option<String>,
}

impl WebhookDemo {
    pub async fn execute(&self, config: &FastLeaseConfig) -> Result<()> {
        let mut webhooks = config.webhooks.clone();
        if !self.endpoints.is_empty() {
            webhooks.endpoints = self.endpoints.clone();
        }
        let dispatcher = NotificationDispatcher::from_config(&webhooks)
            .context("Failed to build webhook dispatcher")?;

        let workflow_id = self
            .workflow_id
            .clone()
            .unwrap_or_else(|| generate_workflow_id(&config.workflow.id_prefix));

        println!("🚀 Webhook workflow {}", workflow_id);
        if webhooks.endpoints.is_empty() {
            println!("⚠️  No endpoints configured: events are recorded but not delivered");
        } else {
            for endpoint in &webhooks.endpoints {
                println!("   📡 {}", endpoint);
            }
        }
        println!();

        let machine = StateMachine::builder().build()?;
        let mut workflow = WebhookWorkflow::new(workflow_id.clone(), machine, dispatcher);

        let span = create_workflow_span(&workflow_id, &generate_correlation_id());
        async {
            for target in HAPPY_PATH {
                match workflow.advance(target).await {
                    Step::Refused => {
                        print_step(target, false);
                        break;
                    }
                    Step::Transitioned { delivered } => {
                        print_step(target, true);
                        match delivered {
                            Some(true) => println!("   📨 webhook delivered"),
                            Some(false) => println!("   📭 webhook not delivered"),
                            None => {}
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await;

        println!();
        println!("📜 Event history ({} events):", workflow.event_history().len());
        for payload in workflow.event_history() {
            println!("   {}", payload.to_json()?);
        }
        println!("🏁 Final state: {}", workflow.state());
        Ok(())
    }
}
