use anyhow::Result;

use crate::workflows::{TransitionTable, WorkflowState};

pub struct TransitionsCommand {
    pub guarded: bool,
}

impl TransitionsCommand {
    pub fn new(guarded: bool) -> Self {
        Self { guarded }
    }

    pub fn execute(&self) -> Result<()> {
        let (name, table) = if self.guarded {
            ("guarded", TransitionTable::guarded())
        } else {
            ("standard", TransitionTable::standard())
        };

        println!("📋 Transition table ({})", name);
        println!();
        for state in WorkflowState::ALL {
            if state.is_terminal() {
                println!("{} (terminal)", state);
                continue;
            }
            println!("{}", state);
            for target in table.allowed_targets(state) {
                let Some(record) = table.record(state, target) else {
                    continue;
                };
                println!("   → {}", target);
                if !record.guards.is_empty() {
                    println!("      guards:  {}", record.guards.join(", "));
                }
                if !record.actions.is_empty() {
                    println!("      actions: {}", record.actions.join(", "));
                }
            }
        }
        Ok(())
    }
}
