use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::{DatabaseConfig, LostFoundConfig};
use crate::persistence::{JsonFileRepository, StateLock};
use crate::workflows::WorkflowCoordinator;

pub mod config_init;
pub mod handoffs;
pub mod items;
pub mod matches;

/// Settings every command runs with, resolved from config and global flags
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub state_file: PathBuf,
    pub json: bool,
    pub operator: Option<String>,
    pub min_score: u8,
    pub metrics_enabled: bool,
    pub database: Option<DatabaseConfig>,
    pub config: LostFoundConfig,
}

impl CommandContext {
    pub fn new(config: &LostFoundConfig, state_file: Option<PathBuf>, json: bool, operator: Option<String>) -> Self {
        Self {
            state_file: state_file.unwrap_or_else(|| config.storage.state_file.clone()),
            json,
            operator: operator.or_else(|| config.operator.default_operator.clone()),
            min_score: config.matching.min_score,
            metrics_enabled: config.observability.metrics_enabled,
            database: config.database.clone(),
            config: config.clone(),
        }
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }
}

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

async fn open_coordinator(ctx: &CommandContext) -> Result<WorkflowCoordinator> {
    #[cfg(feature = "database")]
    {
        if let Some(db) = &ctx.database {
            let repository =
                crate::database::SqliteStateRepository::connect(&db.url, db.max_connections, db.auto_migrate)
                    .await?;
            repository.cleanup_old_snapshots(db.retain_days).await?;
            return Ok(WorkflowCoordinator::open(Arc::new(repository)).await?);
        }
    }
    #[cfg(not(feature = "database"))]
    {
        if ctx.database.is_some() {
            tracing::warn!("Database configured but the database feature is not enabled, using the state file");
        }
    }

    let repository = JsonFileRepository::new(&ctx.state_file);
    Ok(WorkflowCoordinator::open(Arc::new(repository)).await?)
}

/// Run `f` against the committed state while holding the state lock
pub async fn with_coordinator<F, Fut, R>(ctx: &CommandContext, f: F) -> Result<R>
where
    F: FnOnce(WorkflowCoordinator) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let mut lock = StateLock::open(&ctx.state_file)?;
    let _guard = lock.exclusive()?;
    debug!(state_file = %ctx.state_file.display(), "State lock held");

    let coordinator = open_coordinator(ctx).await?.with_min_score(ctx.min_score);
    let result = f(coordinator.clone()).await;
    if ctx.metrics_enabled {
        coordinator.metrics().log_stats();
    }
    result
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn show_how_to_use() -> Result<()> {
    println!("🔎 lostfound - campus lost & found matching and handoffs");
    println!();
    println!("Reports:");
    println!("  📝 lostfound report-lost \"Blue backpack\"    # Someone lost something");
    println!("  📦 lostfound report-found \"Backpack\"        # Someone handed something in");
    println!();
    println!("Matching:");
    println!("  🔍 lostfound candidates --found F1         # Likely owners for a found item");
    println!("  ✅ lostfound confirm L1 F1                 # Confirm and open a handoff");
    println!();
    println!("Handoffs:");
    println!("  📅 lostfound schedule H1 --time 2025-05-01T10:00Z --location \"Main Office\"");
    println!("  🤝 lostfound complete H1                   # Item is back with its owner");
    println!("  📊 lostfound status                        # Dashboard counts");
    println!();
    println!("💡 Add --json to any command for machine-readable output.");
    Ok(())
}
