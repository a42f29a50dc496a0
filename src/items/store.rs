// Item store - owns lost/found reports and their status fields

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::types::*;
use crate::workflows::errors::{EntityKind, WorkflowError, WorkflowResult};

/// Persisted reports. Records are never deleted, only status-transitioned,
/// and statuses change only through the workflow layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStore {
    lost: BTreeMap<LostItemId, LostItem>,
    found: BTreeMap<FoundItemId, FoundItem>,
    next_lost_id: u64,
    next_found_id: u64,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_title(title: &str) -> WorkflowResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(WorkflowError::validation("title", "must not be empty"));
    }
    Ok(title.to_string())
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_lost(&mut self, report: NewLostItem, now: DateTime<Utc>) -> WorkflowResult<LostItem> {
        let title = require_title(&report.title)?;
        self.next_lost_id += 1;
        let item = LostItem {
            id: LostItemId(self.next_lost_id),
            title,
            description: clean(report.description),
            category: clean(report.category),
            subcategory: clean(report.subcategory),
            location: clean(report.location),
            date_lost: report.date_lost,
            image_ref: clean(report.image_ref),
            owner_name: clean(report.owner_name),
            owner_email: clean(report.owner_email),
            reported_by: clean(report.reported_by),
            reported_at: now,
            status: LostStatus::Open,
        };
        info!(lost_item_id = %item.id, title = %item.title, "Lost item reported");
        self.lost.insert(item.id, item.clone());
        Ok(item)
    }

    pub fn report_found(&mut self, report: NewFoundItem, now: DateTime<Utc>) -> WorkflowResult<FoundItem> {
        let title = require_title(&report.title)?;
        self.next_found_id += 1;
        let item = FoundItem {
            id: FoundItemId(self.next_found_id),
            title,
            description: clean(report.description),
            category: clean(report.category),
            subcategory: clean(report.subcategory),
            location: clean(report.location),
            date_found: report.date_found,
            image_ref: clean(report.image_ref),
            reporter_name: clean(report.reporter_name),
            reporter_email: clean(report.reporter_email),
            reported_by: clean(report.reported_by),
            reported_at: now,
            status: FoundStatus::Unclaimed,
        };
        info!(found_item_id = %item.id, title = %item.title, "Found item reported");
        self.found.insert(item.id, item.clone());
        Ok(item)
    }

    pub fn lost(&self, id: LostItemId) -> Option<&LostItem> {
        self.lost.get(&id)
    }

    pub fn found(&self, id: FoundItemId) -> Option<&FoundItem> {
        self.found.get(&id)
    }

    pub fn require_lost(&self, id: LostItemId) -> WorkflowResult<&LostItem> {
        self.lost
            .get(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::LostItem, id))
    }

    pub fn require_found(&self, id: FoundItemId) -> WorkflowResult<&FoundItem> {
        self.found
            .get(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::FoundItem, id))
    }

    /// Lost items, newest report first, optionally restricted by status and reporter
    pub fn list_lost(&self, status: Option<LostStatus>, owner: Option<&str>) -> Vec<LostItem> {
        let mut items: Vec<LostItem> = self
            .lost
            .values()
            .filter(|item| status.map_or(true, |s| item.status == s))
            .filter(|item| owner.map_or(true, |o| item.reported_by.as_deref() == Some(o)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(b.id.cmp(&a.id)));
        items
    }

    /// Found items, newest report first
    pub fn list_found(&self, status: Option<FoundStatus>) -> Vec<FoundItem> {
        let mut items: Vec<FoundItem> = self
            .found
            .values()
            .filter(|item| status.map_or(true, |s| item.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(b.id.cmp(&a.id)));
        items
    }

    pub fn lost_items(&self) -> impl Iterator<Item = &LostItem> {
        self.lost.values()
    }

    pub fn found_items(&self) -> impl Iterator<Item = &FoundItem> {
        self.found.values()
    }

    /// Returns the previous status
    pub(crate) fn set_lost_status(&mut self, id: LostItemId, status: LostStatus) -> WorkflowResult<LostStatus> {
        let item = self
            .lost
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::LostItem, id))?;
        let previous = item.status;
        item.status = status;
        debug!(lost_item_id = %id, from = %previous, to = %status, "Lost item status updated");
        Ok(previous)
    }

    /// Returns the previous status
    pub(crate) fn set_found_status(&mut self, id: FoundItemId, status: FoundStatus) -> WorkflowResult<FoundStatus> {
        let item = self
            .found
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::FoundItem, id))?;
        let previous = item.status;
        item.status = status;
        debug!(found_item_id = %id, from = %previous, to = %status, "Found item status updated");
        Ok(previous)
    }
}
