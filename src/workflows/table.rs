use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::actions;
use super::guards;
use super::registry::Registry;
use super::state::WorkflowState;

/// One edge of the workflow graph with the guards and actions attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: WorkflowState,
    pub to: WorkflowState,
    /// Guard names, all of which must pass (evaluated in order)
    #[serde(default)]
    pub guards: Vec<String>,
    /// Action names, run in order before the state is committed
    #[serde(default)]
    pub actions: Vec<String>,
}

impl TransitionRecord {
    pub fn new(from: WorkflowState, to: WorkflowState) -> Self {
        Self {
            from,
            to,
            guards: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn guarded_by(mut self, guard: impl Into<String>) -> Self {
        self.guards.push(guard.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Transition {from} -> {to} is not part of the workflow graph")]
    EdgeNotInGraph { from: WorkflowState, to: WorkflowState },
    #[error("Transition {from} -> {to} is declared more than once")]
    DuplicateEdge { from: WorkflowState, to: WorkflowState },
    #[error("Transition {from} -> {to} has no record")]
    MissingEdge { from: WorkflowState, to: WorkflowState },
    #[error("Unknown guard '{name}' on transition {from} -> {to}")]
    UnknownGuard {
        name: String,
        from: WorkflowState,
        to: WorkflowState,
    },
    #[error("Unknown action '{name}' on transition {from} -> {to}")]
    UnknownAction {
        name: String,
        from: WorkflowState,
        to: WorkflowState,
    },
}

/// Guards and actions for every edge of the fixed five-state graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    records: Vec<TransitionRecord>,
}

impl TransitionTable {
    /// Build a table from explicit records.
    ///
    /// Every edge of the graph must be covered exactly once and no record may
    /// introduce an edge the graph does not have.
    pub fn from_records(records: Vec<TransitionRecord>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !record.from.successors().contains(&record.to) {
                return Err(TableError::EdgeNotInGraph {
                    from: record.from,
                    to: record.to,
                });
            }
            if !seen.insert((record.from, record.to)) {
                return Err(TableError::DuplicateEdge {
                    from: record.from,
                    to: record.to,
                });
            }
        }

        for (from, to) in graph_edges() {
            if !seen.contains(&(from, to)) {
                return Err(TableError::MissingEdge { from, to });
            }
        }

        Ok(Self { records })
    }

    /// Every edge open, each announcing the stage it enters
    pub fn standard() -> Self {
        let records = graph_edges()
            .map(|(from, to)| TransitionRecord::new(from, to).with_action(actions::ANNOUNCE))
            .collect();
        Self { records }
    }

    /// Standard table with the lease approval checks on the two gated edges
    pub fn guarded() -> Self {
        let mut table = Self::standard();
        table.replace(
            TransitionRecord::new(WorkflowState::Pending, WorkflowState::InProgress)
                .guarded_by(guards::HAS_REQUIRED_DATA)
                .guarded_by(guards::IS_USER_AUTHORIZED)
                .with_action(actions::LOG_TRANSITION)
                .with_action(actions::NOTIFY_USER),
        );
        table.replace(
            TransitionRecord::new(WorkflowState::InProgress, WorkflowState::Approved)
                .guarded_by(guards::IS_AMOUNT_VALID)
                .with_action(actions::LOG_TRANSITION)
                .with_action(actions::RECORD_STATE)
                .with_action(actions::NOTIFY_USER),
        );
        table
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn record(&self, from: WorkflowState, to: WorkflowState) -> Option<&TransitionRecord> {
        self.records.iter().find(|r| r.from == from && r.to == to)
    }

    pub fn allowed_targets(&self, from: WorkflowState) -> Vec<WorkflowState> {
        self.records
            .iter()
            .filter(|r| r.from == from)
            .map(|r| r.to)
            .collect()
    }

    /// Confirm every guard and action name resolves in `registry`
    pub fn check_against(&self, registry: &Registry) -> Result<(), TableError> {
        for record in &self.records {
            if let Some(name) = record.guards.iter().find(|n| registry.guard(n).is_none()) {
                return Err(TableError::UnknownGuard {
                    name: name.clone(),
                    from: record.from,
                    to: record.to,
                });
            }
            if let Some(name) = record.actions.iter().find(|n| registry.action(n).is_none()) {
                return Err(TableError::UnknownAction {
                    name: name.clone(),
                    from: record.from,
                    to: record.to,
                });
            }
        }
        Ok(())
    }

    // Swap the record for an existing edge. Only used on known-valid edges.
    fn replace(&mut self, record: TransitionRecord) {
        if let Some(slot) = self
            .records
            .iter_mut()
            .find(|r| r.from == record.from && r.to == record.to)
        {
            *slot = record;
        }
    }
}

fn graph_edges() -> impl Iterator<Item = (WorkflowState, WorkflowState)> {
    WorkflowState::ALL
        .into_iter()
        .flat_map(|from| from.successors().iter().map(move |to| (from, *to)))
}
