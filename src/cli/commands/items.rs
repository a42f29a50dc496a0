use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;

use super::{print_json, with_coordinator, Command, CommandContext};
use crate::items::{FoundItem, FoundStatus, LostItem, LostStatus, NewFoundItem, NewLostItem};

#[derive(Args, Debug, Clone)]
pub struct ReportLostCommand {
    /// Short title, e.g. "Blue backpack"
    pub title: String,
    #[arg(long, help = "Free-text description used for matching")]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long, help = "Where it was lost")]
    pub location: Option<String>,
    #[arg(long, help = "Date lost (YYYY-MM-DD)")]
    pub date: Option<NaiveDate>,
    #[arg(long, help = "Reference to an uploaded image")]
    pub image: Option<String>,
    #[arg(long)]
    pub owner_name: Option<String>,
    #[arg(long)]
    pub owner_email: Option<String>,
    #[arg(long, help = "Account that filed the report")]
    pub reported_by: Option<String>,
}

impl Command for ReportLostCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let report = NewLostItem {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            location: self.location.clone(),
            date_lost: self.date,
            image_ref: self.image.clone(),
            owner_name: self.owner_name.clone(),
            owner_email: self.owner_email.clone(),
            reported_by: self.reported_by.clone(),
        };
        let item = with_coordinator(ctx, |c| async move { Ok(c.report_lost(report).await?) }).await?;
        if ctx.json {
            return print_json(&item);
        }
        println!("✅ Lost item reported");
        print_lost(&item);
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportFoundCommand {
    /// Short title, e.g. "Backpack"
    pub title: String,
    #[arg(long, help = "Free-text description used for matching")]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long, help = "Where it was found")]
    pub location: Option<String>,
    #[arg(long, help = "Date found (YYYY-MM-DD)")]
    pub date: Option<NaiveDate>,
    #[arg(long, help = "Reference to an uploaded image")]
    pub image: Option<String>,
    #[arg(long)]
    pub reporter_name: Option<String>,
    #[arg(long)]
    pub reporter_email: Option<String>,
    #[arg(long, help = "Account that filed the report")]
    pub reported_by: Option<String>,
}

impl Command for ReportFoundCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let report = NewFoundItem {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            location: self.location.clone(),
            date_found: self.date,
            image_ref: self.image.clone(),
            reporter_name: self.reporter_name.clone(),
            reporter_email: self.reporter_email.clone(),
            reported_by: self.reported_by.clone(),
        };
        let item = with_coordinator(ctx, |c| async move { Ok(c.report_found(report).await?) }).await?;
        if ctx.json {
            return print_json(&item);
        }
        println!("✅ Found item reported");
        print_found(&item);
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListLostCommand {
    #[arg(long, help = "OPEN, MATCHED or RETURNED")]
    pub status: Option<LostStatus>,
    /// Only reports filed by the current user
    #[arg(long, help = "Only show reports filed by --user")]
    pub mine: bool,
    #[arg(long, help = "Current user for --mine (defaults to --operator)")]
    pub user: Option<String>,
}

impl Command for ListLostCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let owner = if self.mine {
            match self.user.as_deref().or(ctx.operator()) {
                Some(user) => Some(user.to_string()),
                None => bail!("--mine needs --user or --operator"),
            }
        } else {
            None
        };
        let status = self.status;
        let items = with_coordinator(ctx, |c| async move {
            Ok(c.list_lost(status, owner.as_deref()).await)
        })
        .await?;

        if ctx.json {
            return print_json(&items);
        }
        if items.is_empty() {
            println!("📋 No lost items");
            return Ok(());
        }
        println!("📋 {} lost item(s)", items.len());
        for item in &items {
            print_lost(item);
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListFoundCommand {
    #[arg(long, help = "UNCLAIMED, MATCHED or RETURNED")]
    pub status: Option<FoundStatus>,
}

impl Command for ListFoundCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let status = self.status;
        let items = with_coordinator(ctx, |c| async move { Ok(c.list_found(status).await) }).await?;

        if ctx.json {
            return print_json(&items);
        }
        if items.is_empty() {
            println!("📋 No found items");
            return Ok(());
        }
        println!("📋 {} found item(s)", items.len());
        for item in &items {
            print_found(item);
        }
        Ok(())
    }
}

pub(crate) fn print_lost(item: &LostItem) {
    println!("  🔎 {} [{}] {}", item.id, item.status, item.title);
    if let Some(description) = &item.description {
        println!("     {description}");
    }
    if let Some(category) = &item.category {
        match &item.subcategory {
            Some(sub) => println!("     🏷️  {category} / {sub}"),
            None => println!("     🏷️  {category}"),
        }
    }
    if let Some(location) = &item.location {
        println!("     📍 {location}");
    }
    if let Some(date) = item.date_lost {
        println!("     📅 Lost on {date}");
    }
}

pub(crate) fn print_found(item: &FoundItem) {
    println!("  📦 {} [{}] {}", item.id, item.status, item.title);
    if let Some(description) = &item.description {
        println!("     {description}");
    }
    if let Some(category) = &item.category {
        match &item.subcategory {
            Some(sub) => println!("     🏷️  {category} / {sub}"),
            None => println!("     🏷️  {category}"),
        }
    }
    if let Some(location) = &item.location {
        println!("     📍 {location}");
    }
    if let Some(date) = item.date_found {
        println!("     📅 Found on {date}");
    }
}
