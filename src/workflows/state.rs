use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle states of a lease workflow
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Pending,
    InProgress,
    Approved,
    Rejected,
    Completed,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 5] = [
        WorkflowState::Pending,
        WorkflowState::InProgress,
        WorkflowState::Approved,
        WorkflowState::Rejected,
        WorkflowState::Completed,
    ];

    /// Targets reachable from this state. The graph is fixed; tables only
    /// decorate these edges with guards and actions.
    pub fn successors(self) -> &'static [WorkflowState] {
        match self {
            WorkflowState::Pending => &[WorkflowState::InProgress, WorkflowState::Rejected],
            WorkflowState::InProgress => &[
                WorkflowState::Approved,
                WorkflowState::Rejected,
                WorkflowState::Pending,
            ],
            WorkflowState::Approved => &[WorkflowState::Completed],
            WorkflowState::Rejected | WorkflowState::Completed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Pending => "pending",
            WorkflowState::InProgress => "in_progress",
            WorkflowState::Approved => "approved",
            WorkflowState::Rejected => "rejected",
            WorkflowState::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown workflow state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for WorkflowState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}
