use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::actions::{self, ActionContext};
use super::context::WorkflowContext;
use super::guards;

pub type GuardFn = Arc<dyn Fn(&WorkflowContext) -> bool + Send + Sync>;
pub type ActionFn = Arc<dyn Fn(&mut ActionContext<'_>) + Send + Sync>;

/// Named guards and actions that transition records refer to
#[derive(Clone, Default)]
pub struct Registry {
    guards: HashMap<String, GuardFn>,
    actions: HashMap<String, ActionFn>,
}

impl Registry {
    /// A registry with nothing in it
    pub fn empty() -> Self {
        Self::default()
    }

    /// The guards and actions shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register_guard(guards::HAS_REQUIRED_DATA, guards::has_required_data)
            .register_guard(guards::IS_AMOUNT_VALID, guards::is_amount_valid)
            .register_guard(guards::IS_USER_AUTHORIZED, guards::is_user_authorized)
            .register_action(actions::ANNOUNCE, actions::announce)
            .register_action(actions::LOG_TRANSITION, actions::log_transition)
            .register_action(actions::NOTIFY_USER, actions::notify_user)
            .register_action(actions::RECORD_STATE, actions::record_state);
        registry
    }

    /// Register (or replace) a guard under `name`
    pub fn register_guard<F>(&mut self, name: impl Into<String>, guard: F) -> &mut Self
    where
        F: Fn(&WorkflowContext) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Arc::new(guard));
        self
    }

    /// Register (or replace) an action under `name`
    pub fn register_action<F>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn(&mut ActionContext<'_>) + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    pub fn guard(&self, name: &str) -> Option<GuardFn> {
        self.guards.get(name).cloned()
    }

    pub fn action(&self, name: &str) -> Option<ActionFn> {
        self.actions.get(name).cloned()
    }

    pub fn guard_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.guards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("guards", &self.guard_names())
            .field("actions", &self.action_names())
            .finish()
    }
}
