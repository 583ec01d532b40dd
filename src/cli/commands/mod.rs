use crate::workflows::{StateMachine, WorkflowState};

pub mod config;
pub mod demo;
pub mod transitions;

pub use config::{ConfigInitCommand, ConfigShowCommand};
pub use demo::{BasicDemo, GuardedDemo, RetryDemo, WebhookDemo};
pub use transitions::TransitionsCommand;

fn print_history(machine: &StateMachine) {
    println!("📜 History ({} transitions):", machine.history().len());
    for (from, to) in machine.history() {
        println!("   {} → {}", from, to);
    }
    println!("🏁 Final state: {}", machine.current_state());
}

fn print_step(target: WorkflowState, committed: bool) {
    if committed {
        println!("✅ → {}", target);
    } else {
        println!("❌ → {} refused", target);
    }
}
