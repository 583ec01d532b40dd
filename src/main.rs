use anyhow::Result;
use clap::Parser;

use fastlease_workflow::cli::commands::{
    BasicDemo, ConfigInitCommand, ConfigShowCommand, GuardedDemo, RetryDemo, TransitionsCommand,
    WebhookDemo,
};
use fastlease_workflow::cli::{Cli, Commands, ConfigAction, DemoScenario};
use fastlease_workflow::config::FastLeaseConfig;
use fastlease_workflow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Writing a fresh file must work even when the current one is broken
    if let Some(Commands::Config {
        action: ConfigAction::Init { path, force },
    }) = &cli.command
    {
        return ConfigInitCommand {
            path: path.clone(),
            force: *force,
        }
        .execute();
    }

    let config = load_config(&cli)?;
    init_telemetry(&config.observability)?;

    match cli.command {
        None => {
            show_getting_started();
            Ok(())
        }
        Some(Commands::Transitions { guarded }) => TransitionsCommand::new(guarded).execute(),
        Some(Commands::Demo { scenario }) => match scenario {
            DemoScenario::Basic => BasicDemo.execute(),
            DemoScenario::Guarded {
                user_id,
                amount,
                role,
                workflow_id,
            } => GuardedDemo {
                user_id,
                amount,
                role,
                workflow_id,
            }
            .execute(&config),
            DemoScenario::Retry {
                failure_rate,
                seed,
                max_attempts,
            } => tokio::runtime::Runtime::new()?.block_on(async {
                RetryDemo {
                    failure_rate,
                    seed,
                    max_attempts,
                }
                .execute(&config)
                .await
            }),
            DemoScenario::Webhooks {
                endpoints,
                workflow_id,
            } => tokio::runtime::Runtime::new()?.block_on(async {
                WebhookDemo {
                    endpoints,
                    workflow_id,
                }
                .execute(&config)
                .await
            }),
        },
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => ConfigShowCommand.execute(&config),
            ConfigAction::Init { .. } => Ok(()),
        },
    }
}

fn load_config(cli: &Cli) -> Result<FastLeaseConfig> {
    if let Err(e) = FastLeaseConfig::load_env_file() {
        eprintln!("⚠️  Ignoring unreadable .env file: {}", e);
    }

    let mut config = FastLeaseConfig::load_with(cli.config.as_deref())?;
    if cli.json_logs {
        config.observability.json_logs = true;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    Ok(config)
}

fn show_getting_started() {
    println!("🚗 FASTLEASE WORKFLOW");
    println!("=====================");
    println!();
    println!("▶️  'fastlease-workflow transitions' shows the workflow graph");
    println!("▶️  'fastlease-workflow demo basic' walks a lease application to completion");
    println!("▶️  'fastlease-workflow demo retry --seed 7' runs a flaky call under retries");
    println!("▶️  'fastlease-workflow config init' writes fastlease.toml");
}
