// Durable storage for the workflow state
//
// The whole workspace (reports plus handoffs) is saved as one snapshot per
// committed command, so a save either lands completely or not at all.

pub mod json_file;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::handoff::{Handoff, HandoffStatus};
use crate::items::{FoundStatus, LostStatus};
use crate::workflows::WorkflowState;

pub use json_file::{JsonFileRepository, StateLock};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {reason}")]
    Lock { reason: String },

    #[error("State corruption detected: {reason}")]
    Corruption { reason: String },

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A committed workspace as written to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: WorkflowState,
}

impl WorkflowSnapshot {
    pub fn new(state: WorkflowState, saved_at: DateTime<Utc>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at,
            state,
        }
    }

    /// Reject snapshots from another format, with two handoffs for one pair,
    /// or whose item statuses disagree with their handoffs.
    pub fn verify(&self) -> PersistenceResult<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(corruption(format!(
                "unsupported snapshot format {} (expected {})",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        let mut pairs = HashSet::new();
        for handoff in self.state.ledger.iter() {
            if self.state.items.lost(handoff.lost_item_id).is_none()
                || self.state.items.found(handoff.found_item_id).is_none()
            {
                return Err(corruption(format!("handoff {} references a missing item", handoff.id)));
            }
            if !pairs.insert(handoff.pair()) {
                return Err(corruption(format!(
                    "pair {} has more than one handoff (second is {})",
                    handoff.pair(),
                    handoff.id
                )));
            }
        }

        for lost in self.state.items.lost_items() {
            let expected = match derived(self.state.ledger.for_lost(lost.id)) {
                Derived::Returned => LostStatus::Returned,
                Derived::Matched => LostStatus::Matched,
                Derived::Free => LostStatus::Open,
            };
            if lost.status != expected {
                return Err(corruption(format!(
                    "lost item {} is {} but its handoffs say {}",
                    lost.id,
                    lost.status.as_str(),
                    expected.as_str()
                )));
            }
        }
        for found in self.state.items.found_items() {
            let expected = match derived(self.state.ledger.for_found(found.id)) {
                Derived::Returned => FoundStatus::Returned,
                Derived::Matched => FoundStatus::Matched,
                Derived::Free => FoundStatus::Unclaimed,
            };
            if found.status != expected {
                return Err(corruption(format!(
                    "found item {} is {} but its handoffs say {}",
                    found.id,
                    found.status.as_str(),
                    expected.as_str()
                )));
            }
        }
        Ok(())
    }
}

enum Derived {
    Free,
    Matched,
    Returned,
}

/// Any completed handoff returns the item; any other handoff holds it
fn derived<'a>(handoffs: impl Iterator<Item = &'a Handoff>) -> Derived {
    let mut status = Derived::Free;
    for handoff in handoffs {
        if handoff.status == HandoffStatus::Completed {
            return Derived::Returned;
        }
        status = Derived::Matched;
    }
    status
}

fn corruption(reason: String) -> PersistenceError {
    PersistenceError::Corruption { reason }
}

/// Backing store for committed snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Latest committed snapshot, `None` when nothing has been saved yet
    async fn load(&self) -> PersistenceResult<Option<WorkflowSnapshot>>;

    async fn save(&self, snapshot: &WorkflowSnapshot) -> PersistenceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::PairKey;
    use crate::items::{NewFoundItem, NewLostItem};

    #[test]
    fn test_verify_accepts_consistent_state() {
        let mut state = WorkflowState::default();
        let now = Utc::now();
        let lost = state.items.report_lost(NewLostItem::titled("Keys"), now).unwrap();
        let found = state.items.report_found(NewFoundItem::titled("Keys"), now).unwrap();
        state.items.set_lost_status(lost.id, LostStatus::Matched).unwrap();
        state.items.set_found_status(found.id, FoundStatus::Matched).unwrap();
        state
            .ledger
            .open(PairKey::new(lost.id, found.id), "system", None, now)
            .unwrap();

        assert!(WorkflowSnapshot::new(state, now).verify().is_ok());
    }

    #[test]
    fn test_verify_rejects_status_that_disagrees_with_handoffs() {
        let mut state = WorkflowState::default();
        let now = Utc::now();
        let lost = state.items.report_lost(NewLostItem::titled("Keys"), now).unwrap();
        let found = state.items.report_found(NewFoundItem::titled("Keys"), now).unwrap();
        state.items.set_lost_status(lost.id, LostStatus::Matched).unwrap();
        state
            .ledger
            .open(PairKey::new(lost.id, found.id), "system", None, now)
            .unwrap();

        // found side still UNCLAIMED while a handoff holds it
        let snapshot = WorkflowSnapshot::new(state.clone(), now);
        assert!(matches!(snapshot.verify(), Err(PersistenceError::Corruption { .. })));

        // a RETURNED lost item needs a completed handoff
        state.items.set_found_status(found.id, FoundStatus::Matched).unwrap();
        state.items.set_lost_status(lost.id, LostStatus::Returned).unwrap();
        let snapshot = WorkflowSnapshot::new(state, now);
        assert!(matches!(snapshot.verify(), Err(PersistenceError::Corruption { .. })));
    }

    #[test]
    fn test_verify_rejects_two_handoffs_for_one_pair() {
        let now = Utc::now();
        let mut state = WorkflowState::default();
        let lost = state.items.report_lost(NewLostItem::titled("Keys"), now).unwrap();
        let found = state.items.report_found(NewFoundItem::titled("Keys"), now).unwrap();
        state.items.set_lost_status(lost.id, LostStatus::Matched).unwrap();
        state.items.set_found_status(found.id, FoundStatus::Matched).unwrap();
        state
            .ledger
            .open(PairKey::new(lost.id, found.id), "system", None, now)
            .unwrap();

        let mut value = serde_json::to_value(&state).unwrap();
        let handoffs = value["ledger"]["handoffs"].as_array_mut().unwrap();
        let mut twin = handoffs[0].clone();
        twin["id"] = serde_json::json!(2);
        handoffs.push(twin);
        let state: WorkflowState = serde_json::from_value(value).unwrap();
        assert_eq!(state.ledger.len(), 2);

        match WorkflowSnapshot::new(state, now).verify() {
            Err(PersistenceError::Corruption { reason }) => assert!(reason.contains("more than one handoff")),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_dangling_handoff_and_unknown_format() {
        let mut state = WorkflowState::default();
        let now = Utc::now();
        let lost = state.items.report_lost(NewLostItem::titled("Keys"), now).unwrap();
        state
            .ledger
            .open(PairKey::new(lost.id, crate::items::FoundItemId(7)), "system", None, now)
            .unwrap();
        let snapshot = WorkflowSnapshot::new(state, now);
        assert!(matches!(snapshot.verify(), Err(PersistenceError::Corruption { .. })));

        let mut snapshot = WorkflowSnapshot::new(WorkflowState::default(), now);
        snapshot.format_version = 99;
        assert!(matches!(snapshot.verify(), Err(PersistenceError::Corruption { .. })));
    }
}
