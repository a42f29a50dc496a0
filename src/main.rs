use anyhow::Result;
use clap::Parser;

use lostfound::cli::commands::{show_how_to_use, Command, CommandContext};
use lostfound::cli::{Cli, Commands};
use lostfound::config::config;
use lostfound::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?;
    init_telemetry(&config.observability.log_level, config.observability.json_logs)?;
    let ctx = CommandContext::new(config, cli.state_file, cli.json, cli.operator);

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        // No subcommand: explain how to get started
        None => show_how_to_use(),
        Some(Commands::ReportLost(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::ReportFound(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Lost(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Found(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Candidates(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Matches(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Confirm(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Handoffs(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Schedule(cmd)) => runtime.block_on(cmd.schedule(&ctx)),
        Some(Commands::Reschedule(cmd)) => runtime.block_on(cmd.reschedule(&ctx)),
        Some(Commands::Cancel(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Complete(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Update(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Reject(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::Status(cmd)) => runtime.block_on(cmd.execute(&ctx)),
        Some(Commands::ConfigInit(cmd)) => runtime.block_on(cmd.execute(&ctx)),
    }
}
