// Table-driven workflow state machine.
// Failure is always reported as `false`; nothing here returns an error once built.

use std::collections::HashMap;
use std::fmt;

use super::actions::ActionContext;
use super::context::WorkflowContext;
use super::registry::{ActionFn, GuardFn, Registry};
use super::state::WorkflowState;
use super::table::{TableError, TransitionTable};
use crate::observer::{RefusalReason, SharedObserver, TracingObserver, WorkflowEvent};

struct ResolvedTransition {
    guards: Vec<(String, GuardFn)>,
    actions: Vec<ActionFn>,
}

pub struct StateMachine {
    current: WorkflowState,
    context: WorkflowContext,
    table: TransitionTable,
    resolved: HashMap<(WorkflowState, WorkflowState), ResolvedTransition>,
    history: Vec<(WorkflowState, WorkflowState)>,
    observer: SharedObserver,
}

impl StateMachine {
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    pub fn current_state(&self) -> WorkflowState {
        self.current
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.context
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Committed transitions, oldest first
    pub fn history(&self) -> &[(WorkflowState, WorkflowState)] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn allowed_targets(&self) -> Vec<WorkflowState> {
        self.table.allowed_targets(self.current)
    }

    /// Whether `target` is an allowed successor of the current state.
    /// Guards are not evaluated and no action runs.
    pub fn can_transition(&self, target: WorkflowState) -> bool {
        self.resolved.contains_key(&(self.current, target))
    }

    /// Move to `target` if the edge exists and all of its guards pass.
    ///
    /// Actions run after the guards and before the new state is committed.
    /// On `false` the state, context and history are left as they were.
    pub fn transition(&mut self, target: WorkflowState) -> bool {
        let from = self.current;
        let Some(entry) = self.resolved.get(&(from, target)) else {
            self.observer.on_event(&WorkflowEvent::TransitionRefused {
                from,
                to: target,
                reason: RefusalReason::NotPermitted,
            });
            return false;
        };

        if let Some((name, _)) = entry.guards.iter().find(|(_, guard)| !guard(&self.context)) {
            self.observer.on_event(&WorkflowEvent::TransitionRefused {
                from,
                to: target,
                reason: RefusalReason::GuardFailed {
                    guard: name.clone(),
                },
            });
            return false;
        }

        let mut action_ctx = ActionContext {
            from,
            to: target,
            context: &mut self.context,
            observer: self.observer.as_ref(),
        };
        for action in &entry.actions {
            action(&mut action_ctx);
        }

        self.current = target;
        self.history.push((from, target));
        self.observer
            .on_event(&WorkflowEvent::TransitionCommitted { from, to: target });
        true
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("context", &self.context)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// Assembles a machine from a table, a registry and an observer
pub struct StateMachineBuilder {
    initial_state: WorkflowState,
    context: WorkflowContext,
    table: TransitionTable,
    registry: Registry,
    observer: SharedObserver,
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: WorkflowState::Pending,
            context: WorkflowContext::new(),
            table: TransitionTable::standard(),
            registry: Registry::builtin(),
            observer: TracingObserver::shared(),
        }
    }
}

impl StateMachineBuilder {
    pub fn initial_state(mut self, state: WorkflowState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn context(mut self, context: WorkflowContext) -> Self {
        self.context = context;
        self
    }

    pub fn table(mut self, table: TransitionTable) -> Self {
        self.table = table;
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Resolve every guard and action name against the registry
    pub fn build(self) -> Result<StateMachine, TableError> {
        self.table.check_against(&self.registry)?;

        let mut resolved = HashMap::new();
        for record in self.table.records() {
            let guards = record
                .guards
                .iter()
                .filter_map(|name| self.registry.guard(name).map(|g| (name.clone(), g)))
                .collect();
            let actions = record
                .actions
                .iter()
                .filter_map(|name| self.registry.action(name))
                .collect();
            resolved.insert(
                (record.from, record.to),
                ResolvedTransition { guards, actions },
            );
        }

        Ok(StateMachine {
            current: self.initial_state,
            context: self.context,
            table: self.table,
            resolved,
            history: Vec::new(),
            observer: self.observer,
        })
    }
}
