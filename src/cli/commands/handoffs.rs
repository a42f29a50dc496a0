use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use super::{print_json, with_coordinator, Command, CommandContext};
use crate::cli::{parse_time, ScheduleArgs};
use crate::handoff::{
    available_actions, Handoff, HandoffId, HandoffStatus, HandoffUpdate, ScheduleRequest,
    StatusFilter, StatusSummary,
};

#[derive(Args, Debug, Clone)]
pub struct HandoffsCommand {
    #[arg(long, default_value = "ALL", help = "ALL, PENDING, SCHEDULED, COMPLETED or CANCELLED")]
    pub status: StatusFilter,
    #[arg(long, help = "Only handoffs assigned to this operator")]
    pub assigned_to: Option<String>,
}

impl Command for HandoffsCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let filter = self.status;
        let assigned_to = self.assigned_to.as_deref();
        let (handoffs, summary) = with_coordinator(ctx, |c| async move {
            Ok((c.list_handoffs(filter, assigned_to).await, c.status_summary().await))
        })
        .await?;

        if ctx.json {
            return print_json(&handoffs);
        }
        if handoffs.is_empty() {
            println!("📋 No handoffs");
            return Ok(());
        }
        println!(
            "📋 {} handoff(s) shown, {} matching status overall",
            handoffs.len(),
            summary.count(filter)
        );
        for handoff in &handoffs {
            print_handoff(handoff);
        }
        Ok(())
    }
}

/// Used for both `schedule` and `reschedule`; the subcommand picks the transition
#[derive(Args, Debug, Clone)]
pub struct ScheduleCommand {
    /// Handoff, e.g. H1
    pub id: HandoffId,
    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

impl ScheduleCommand {
    fn request(&self) -> ScheduleRequest {
        let mut request = ScheduleRequest::new(self.schedule.time, &self.schedule.location);
        request.assigned_to = self.schedule.assign.clone();
        request
    }

    pub async fn schedule(&self, ctx: &CommandContext) -> Result<()> {
        let (id, request) = (self.id, self.request());
        let handoff = with_coordinator(ctx, |c| async move { Ok(c.schedule(id, request).await?) }).await?;
        report(ctx, "📅 Handoff scheduled", &handoff)
    }

    pub async fn reschedule(&self, ctx: &CommandContext) -> Result<()> {
        let (id, request) = (self.id, self.request());
        let handoff = with_coordinator(ctx, |c| async move { Ok(c.reschedule(id, request).await?) }).await?;
        report(ctx, "📅 Handoff rescheduled", &handoff)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CancelCommand {
    /// Handoff, e.g. H1
    pub id: HandoffId,
}

impl Command for CancelCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let id = self.id;
        let handoff = with_coordinator(ctx, |c| async move { Ok(c.cancel(id).await?) }).await?;
        report(ctx, "↩️  Handoff cancelled, back to PENDING", &handoff)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompleteCommand {
    /// Handoff, e.g. H1
    pub id: HandoffId,
}

impl Command for CompleteCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let id = self.id;
        let operator = ctx.operator();
        let handoff = with_coordinator(ctx, |c| async move { Ok(c.complete(id, operator).await?) }).await?;
        report(ctx, "🎉 Handoff completed, items returned", &handoff)
    }
}

#[derive(Args, Debug, Clone)]
pub struct UpdateCommand {
    /// Handoff, e.g. H1
    pub id: HandoffId,
    #[arg(long, help = "Target status: PENDING, SCHEDULED, COMPLETED or CANCELLED")]
    pub status: HandoffStatus,
    #[arg(long, help = "Operator assigned to the handoff")]
    pub assign: Option<String>,
    #[arg(long, value_parser = parse_time, help = "Handoff time, e.g. 2025-05-01T10:00Z")]
    pub time: Option<DateTime<Utc>>,
    #[arg(long, help = "Handoff location")]
    pub location: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, help = "Cancellation reason (kept when status is CANCELLED)")]
    pub reason: Option<String>,
}

impl Command for UpdateCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let id = self.id;
        let update = HandoffUpdate {
            status: self.status,
            assigned_to: self.assign.clone(),
            scheduled_handoff_time: self.time,
            handoff_location: self.location.clone(),
            notes: self.notes.clone(),
            cancellation_reason: self.reason.clone(),
            updated_by: ctx.operator.clone(),
        };
        let handoff = with_coordinator(ctx, |c| async move { Ok(c.update(id, update).await?) }).await?;
        report(ctx, "✏️  Handoff updated", &handoff)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RejectCommand {
    /// Handoff, e.g. H1
    pub id: HandoffId,
}

impl Command for RejectCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let id = self.id;
        let removed = with_coordinator(ctx, |c| async move { Ok(c.reject_match(id).await?) }).await?;
        if ctx.json {
            return print_json(&removed);
        }
        println!(
            "🗑️  Handoff {} rejected: {} and {} released",
            removed.id, removed.lost_item_id, removed.found_item_id
        );
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusCommand {}

#[derive(Serialize)]
struct Dashboard {
    handoffs: StatusSummary,
    lost_items: usize,
    found_items: usize,
}

impl Command for StatusCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let dashboard = with_coordinator(ctx, |c| async move {
            Ok(Dashboard {
                handoffs: c.status_summary().await,
                lost_items: c.list_lost(None, None).await.len(),
                found_items: c.list_found(None).await.len(),
            })
        })
        .await?;

        if ctx.json {
            return print_json(&dashboard);
        }
        let summary = dashboard.handoffs;
        println!("📊 Lost & found status");
        println!("  🔎 Lost reports:  {}", dashboard.lost_items);
        println!("  📦 Found reports: {}", dashboard.found_items);
        println!("  🤝 Handoffs:      {}", summary.total);
        println!("     ⏳ PENDING:    {}", summary.pending);
        println!("     📅 SCHEDULED:  {}", summary.scheduled);
        println!("     ✅ COMPLETED:  {}", summary.completed);
        println!("     ❌ CANCELLED:  {}", summary.cancelled);
        Ok(())
    }
}

fn report(ctx: &CommandContext, headline: &str, handoff: &Handoff) -> Result<()> {
    if ctx.json {
        return print_json(handoff);
    }
    println!("{headline}");
    print_handoff(handoff);
    Ok(())
}

pub(crate) fn print_handoff(handoff: &Handoff) {
    println!("  🤝 {} [{}]", handoff.id, handoff.status);
    println!("     🔗 {} ↔ {}", handoff.lost_item_id, handoff.found_item_id);
    if let Some(who) = &handoff.assigned_to {
        println!("     👤 Assigned to: {who}");
    }
    if let Some(time) = handoff.scheduled_handoff_time {
        println!("     🕒 Scheduled: {}", time.to_rfc3339());
    }
    if let Some(location) = &handoff.handoff_location {
        println!("     📍 Location: {location}");
    }
    if let Some(notes) = &handoff.notes {
        println!("     📝 {notes}");
    }
    if let Some(reason) = &handoff.cancellation_reason {
        println!("     ❌ Cancellation reason: {reason}");
    }
    if let (Some(at), by) = (handoff.completed_at, &handoff.completed_by) {
        match by {
            Some(by) => println!("     🎉 Completed {} by {by}", at.to_rfc3339()),
            None => println!("     🎉 Completed {}", at.to_rfc3339()),
        }
    }
    let actions = available_actions(handoff.status);
    if !actions.is_empty() {
        let names: Vec<String> = actions.iter().map(|a| format!("{a:?}").to_lowercase()).collect();
        println!("     ▶️  Next: {}", names.join(", "));
    }
}
