use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{Command, CommandContext};

#[derive(Args, Debug, Clone)]
pub struct ConfigInitCommand {
    #[arg(long, default_value = "lostfound.toml", help = "Where to write the configuration")]
    pub path: PathBuf,
    /// Overwrite an existing file
    #[arg(long, help = "Overwrite the file if it already exists")]
    pub force: bool,
}

impl Command for ConfigInitCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if self.path.exists() && !self.force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                self.path.display()
            );
        }

        let mut config = ctx.config.clone();
        config.storage.state_file = ctx.state_file.clone();
        config.operator.default_operator = ctx.operator.clone();
        config.save_to_file(&self.path)?;
        info!(path = %self.path.display(), "Configuration written");

        println!("✅ Configuration written to {}", self.path.display());
        println!("   💾 State file: {}", config.storage.state_file.display());
        println!("   🎯 Minimum candidate score: {}", config.matching.min_score);
        Ok(())
    }
}
