use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::handoff::parse_timestamp;

pub mod commands;

use commands::{
    config_init::ConfigInitCommand,
    handoffs::{
        CancelCommand, CompleteCommand, HandoffsCommand, RejectCommand, ScheduleCommand,
        StatusCommand, UpdateCommand,
    },
    items::{ListFoundCommand, ListLostCommand, ReportFoundCommand, ReportLostCommand},
    matches::{CandidatesCommand, ConfirmCommand, MatchesCommand},
};

#[derive(Parser)]
#[command(name = "lostfound")]
#[command(about = "Campus lost & found: match reports and track handoffs")]
#[command(long_about = "lostfound records lost and found reports, surfaces likely matches, and drives \
                       each confirmed match through a scheduled handoff until the item is returned. \
                       Get started with 'lostfound report-lost' or 'lostfound report-found'.")]
pub struct Cli {
    /// State file to use instead of the configured one
    #[arg(long, global = true, help = "Path to the workflow state file")]
    pub state_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, help = "Print command results as JSON")]
    pub json: bool,

    /// Operator recorded on confirmations and completions
    #[arg(long, global = true, help = "Operator name recorded on handoffs")]
    pub operator: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a lost item report
    ReportLost(ReportLostCommand),
    /// Record a found item report
    ReportFound(ReportFoundCommand),
    /// List lost item reports
    Lost(ListLostCommand),
    /// List found item reports
    Found(ListFoundCommand),
    /// Show candidate matches for one found or lost item
    Candidates(CandidatesCommand),
    /// Show every found item with its candidates
    Matches(MatchesCommand),
    /// Confirm a lost/found pair and open a handoff
    Confirm(ConfirmCommand),
    /// List handoffs
    Handoffs(HandoffsCommand),
    /// Schedule a pending handoff
    Schedule(ScheduleCommand),
    /// Move a scheduled handoff to a new time or place
    Reschedule(ScheduleCommand),
    /// Cancel a scheduled handoff (returns it to PENDING)
    Cancel(CancelCommand),
    /// Mark a scheduled handoff as completed and both items as returned
    Complete(CompleteCommand),
    /// Edit a handoff directly
    Update(UpdateCommand),
    /// Reject a match and delete its handoff
    Reject(RejectCommand),
    /// Dashboard counts per handoff status
    Status(StatusCommand),
    /// Write a configuration file with the current settings
    ConfigInit(ConfigInitCommand),
}

/// Schedule fields shared by `schedule` and `reschedule`
#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// ISO-8601 handoff time
    #[arg(long, value_parser = parse_time, help = "Handoff time, e.g. 2025-05-01T10:00Z")]
    pub time: DateTime<Utc>,
    /// Where the handoff happens
    #[arg(long, help = "Handoff location")]
    pub location: String,
    /// Operator running the handoff
    #[arg(long, help = "Operator assigned to the handoff")]
    pub assign: Option<String>,
}

pub fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_schedule_with_global_flags() {
        let cli = Cli::try_parse_from([
            "lostfound",
            "schedule",
            "H1",
            "--time",
            "2025-05-01T10:00Z",
            "--location",
            "Main Office",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Schedule(_))));
    }

    #[test]
    fn test_rejects_bad_time() {
        let result = Cli::try_parse_from([
            "lostfound", "schedule", "H1", "--time", "soon", "--location", "Desk",
        ]);
        assert!(result.is_err());
    }
}
