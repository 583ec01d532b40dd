// Workflow state machine: states, context, guards, actions and the tables tying them together

pub mod actions;
pub mod context;
pub mod guards;
pub mod registry;
pub mod state;
pub mod state_machine;
pub mod table;

pub use actions::ActionContext;
pub use context::WorkflowContext;
pub use registry::Registry;
pub use state::WorkflowState;
pub use state_machine::{StateMachine, StateMachineBuilder};
pub use table::{TableError, TransitionRecord, TransitionTable};
