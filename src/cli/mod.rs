use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::drivers::simulation::check_rate;

pub mod commands;

#[derive(Parser)]
#[command(name = "fastlease-workflow")]
#[command(about = "Lease application workflow engine: state machine, retries and webhooks")]
#[command(long_about = "Drives FastLease lease applications through pending, in_progress, approved, \
                       rejected and completed, retries flaky downstream calls and notifies webhook \
                       receivers. Start with 'fastlease-workflow transitions' to see the workflow graph.")]
pub struct Cli {
    /// Configuration file layered above fastlease.toml
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,
    /// Emit JSON log lines
    #[arg(long, global = true, help = "Write structured JSON logs to stderr")]
    pub json_logs: bool,
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, help = "Log level: trace, debug, info, warn, error")]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the transition table with guards and actions per edge
    Transitions {
        /// Show the table with authorization and amount guards
        #[arg(long, help = "Show the guarded table instead of the standard one")]
        guarded: bool,
    },
    /// Run a workflow scenario end to end
    Demo {
        #[command(subcommand)]
        scenario: DemoScenario,
    },
    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum DemoScenario {
    /// Walk pending → in_progress → approved → completed without guards
    Basic,
    /// Run the guarded table for one lease application
    Guarded {
        #[arg(long, default_value = "user_123", help = "Applicant user id")]
        user_id: String,
        #[arg(long, default_value = "50000", help = "Requested amount")]
        amount: f64,
        #[arg(long, default_value = "manager", help = "Role of the acting user")]
        role: String,
        #[arg(long, help = "Workflow id (generated when omitted)")]
        workflow_id: Option<String>,
    },
    /// Run a flaky operation under the retry executor
    Retry {
        #[arg(long, default_value = "0.7", value_parser = parse_failure_rate, help = "Probability that one attempt fails (0 to 1)")]
        failure_rate: f64,
        #[arg(long, help = "Seed for a reproducible run")]
        seed: Option<u64>,
        #[arg(long, help = "Override retry.max_attempts")]
        max_attempts: Option<u32>,
    },
    /// Run a workflow that notifies webhook receivers on each transition
    Webhooks {
        #[arg(long = "endpoint", help = "Webhook URL; repeat for several (defaults to webhooks.endpoints)")]
        endpoints: Vec<String>,
        #[arg(long, help = "Workflow id (generated when omitted)")]
        workflow_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write a configuration file with default values
    Init {
        #[arg(long, default_value = "fastlease.toml", help = "Where to write the file")]
        path: PathBuf,
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

fn parse_failure_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value.parse().map_err(|e| format!("{e}"))?;
    check_rate(rate).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate_must_be_a_probability() {
        assert_eq!(parse_failure_rate("0.25"), Ok(0.25));
        assert!(parse_failure_rate("NaN").is_err());
        assert!(parse_failure_rate("inf").is_err());
        assert!(parse_failure_rate("1.5").is_err());
        assert!(parse_failure_rate("often").is_err());
    }

    #[test]
    fn test_retry_demo_rejects_nan_rate() {
        let parsed = Cli::try_parse_from([
            "fastlease-workflow",
            "demo",
            "retry",
            "--failure-rate",
            "NaN",
        ]);
        assert!(parsed.is_err());
    }
}
