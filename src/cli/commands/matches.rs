use anyhow::Result;
use clap::Args;

use super::handoffs::print_handoff;
use super::{print_json, with_coordinator, Command, CommandContext};
use crate::items::{FoundItemId, LostItemId};
use crate::matching::{FoundMatchView, MatchView};

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CandidatesCommand {
    #[arg(long, help = "Found item to find owners for, e.g. F3")]
    pub found: Option<FoundItemId>,
    #[arg(long, help = "Lost item to find matches for, e.g. L2")]
    pub lost: Option<LostItemId>,
}

impl Command for CandidatesCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        if let Some(found_id) = self.found {
            let views = with_coordinator(ctx, |c| async move { Ok(c.candidates_for_found(found_id).await?) }).await?;
            if ctx.json {
                return print_json(&views);
            }
            if views.is_empty() {
                println!("📋 No candidates for {found_id}");
                return Ok(());
            }
            println!("🔍 {} candidate(s) for {found_id}", views.len());
            for view in &views {
                print_match(view);
            }
            return Ok(());
        }

        if let Some(lost_id) = self.lost {
            let views = with_coordinator(ctx, |c| async move { Ok(c.candidates_for_lost(lost_id).await?) }).await?;
            if ctx.json {
                return print_json(&views);
            }
            if views.is_empty() {
                println!("📋 No candidates for {lost_id}");
                return Ok(());
            }
            println!("🔍 {} candidate(s) for {lost_id}", views.len());
            for view in &views {
                print_found_match(view);
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct MatchesCommand {
    /// Hide found items without any candidate
    #[arg(long, help = "Only show found items that have candidates")]
    pub with_candidates: bool,
}

impl Command for MatchesCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut overview = with_coordinator(ctx, |c| async move { Ok(c.matches_overview().await?) }).await?;
        if self.with_candidates {
            overview.retain(|row| row.total_matches > 0);
        }
        if ctx.json {
            return print_json(&overview);
        }
        if overview.is_empty() {
            println!("📋 No found items");
            return Ok(());
        }
        for row in &overview {
            println!(
                "📦 {} [{}] {} - {} candidate(s), {} confirmed",
                row.found_item.id,
                row.found_item.status,
                row.found_item.title,
                row.total_matches,
                row.confirmed_matches
            );
            for view in &row.matches {
                print_match(view);
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmCommand {
    /// Lost item, e.g. L1
    pub lost: LostItemId,
    /// Found item, e.g. F1
    pub found: FoundItemId,
}

impl Command for ConfirmCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let (lost, found) = (self.lost, self.found);
        let operator = ctx.operator();
        let handoff = with_coordinator(ctx, |c| async move {
            Ok(c.confirm_match(lost, found, operator).await?)
        })
        .await?;
        if ctx.json {
            return print_json(&handoff);
        }
        println!("✅ Match confirmed: {lost} ↔ {found}");
        print_handoff(&handoff);
        Ok(())
    }
}

fn print_match(view: &MatchView) {
    let marker = if view.confirmed { "✅" } else { "  " };
    println!(
        "  {marker} {} {:>3}% {} ({})",
        view.lost_item.id, view.confidence_score, view.lost_item.title, view.reason
    );
    if let Some(handoff_id) = view.handoff_id {
        println!("       🤝 Handoff {handoff_id}");
    }
}

fn print_found_match(view: &FoundMatchView) {
    let marker = if view.confirmed { "✅" } else { "  " };
    println!(
        "  {marker} {} {:>3}% {} ({})",
        view.found_item.id, view.confidence_score, view.found_item.title, view.reason
    );
    if let Some(handoff_id) = view.handoff_id {
        println!("       🤝 Handoff {handoff_id}");
    }
}
