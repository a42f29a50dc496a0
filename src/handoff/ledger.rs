// Handoff ledger - owns every live handoff and the pair index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use super::state_machine::{self, HandoffEvent, TransitionOutcome};
use super::types::*;
use crate::items::{FoundItemId, LostItemId};
use crate::workflows::errors::{EntityKind, WorkflowError, WorkflowResult};

/// Serialized form of the ledger; the pair index is rebuilt on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerRecord {
    next_id: u64,
    handoffs: Vec<Handoff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LedgerRecord", into = "LedgerRecord")]
pub struct HandoffLedger {
    handoffs: BTreeMap<HandoffId, Handoff>,
    by_pair: HashMap<PairKey, HandoffId>,
    next_id: u64,
}

impl From<LedgerRecord> for HandoffLedger {
    fn from(record: LedgerRecord) -> Self {
        let mut ledger = HandoffLedger {
            next_id: record.next_id,
            ..Default::default()
        };
        for handoff in record.handoffs {
            ledger.next_id = ledger.next_id.max(handoff.id.0);
            ledger.by_pair.insert(handoff.pair(), handoff.id);
            ledger.handoffs.insert(handoff.id, handoff);
        }
        ledger
    }
}

impl From<HandoffLedger> for LedgerRecord {
    fn from(ledger: HandoffLedger) -> Self {
        LedgerRecord {
            next_id: ledger.next_id,
            handoffs: ledger.handoffs.into_values().collect(),
        }
    }
}

impl HandoffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handoffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handoffs.is_empty()
    }

    pub fn get(&self, id: HandoffId) -> Option<&Handoff> {
        self.handoffs.get(&id)
    }

    pub fn require(&self, id: HandoffId) -> WorkflowResult<&Handoff> {
        self.handoffs
            .get(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Handoff, id))
    }

    /// The live handoff for a pair, if any
    pub fn live_for_pair(&self, pair: PairKey) -> Option<&Handoff> {
        self.by_pair.get(&pair).and_then(|id| self.handoffs.get(id))
    }

    pub fn is_confirmed(&self, pair: PairKey) -> bool {
        self.by_pair.contains_key(&pair)
    }

    pub fn for_found(&self, found: FoundItemId) -> impl Iterator<Item = &Handoff> {
        self.handoffs.values().filter(move |h| h.found_item_id == found)
    }

    pub fn for_lost(&self, lost: LostItemId) -> impl Iterator<Item = &Handoff> {
        self.handoffs.values().filter(move |h| h.lost_item_id == lost)
    }

    /// Open a PENDING handoff for a pair. At most one live handoff per pair.
    pub fn open(
        &mut self,
        pair: PairKey,
        initiated_by: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Handoff> {
        if let Some(existing) = self.live_for_pair(pair) {
            warn!(
                handoff_id = %existing.id,
                lost_item_id = %pair.lost,
                found_item_id = %pair.found,
                "Pair already has a live handoff"
            );
            return Err(WorkflowError::conflict(format!(
                "pair {pair} already has live handoff {}",
                existing.id
            )));
        }

        self.next_id += 1;
        let handoff = Handoff {
            id: HandoffId(self.next_id),
            lost_item_id: pair.lost,
            found_item_id: pair.found,
            status: HandoffStatus::Pending,
            assigned_to: None,
            scheduled_handoff_time: None,
            handoff_location: None,
            notes,
            cancellation_reason: None,
            initiated_by: initiated_by.to_string(),
            initiated_at: now,
            updated_at: now,
            completed_by: None,
            completed_at: None,
        };
        self.by_pair.insert(pair, handoff.id);
        self.handoffs.insert(handoff.id, handoff.clone());
        info!(
            handoff_id = %handoff.id,
            lost_item_id = %pair.lost,
            found_item_id = %pair.found,
            "Handoff opened"
        );
        Ok(handoff)
    }

    pub fn apply(
        &mut self,
        id: HandoffId,
        event: HandoffEvent,
        now: DateTime<Utc>,
    ) -> WorkflowResult<(Handoff, TransitionOutcome)> {
        let handoff = self
            .handoffs
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Handoff, id))?;
        let outcome = state_machine::apply(handoff, event, now)?;
        Ok((handoff.clone(), outcome))
    }

    /// Delete a non-completed handoff, returning the removed record
    pub fn remove(&mut self, id: HandoffId) -> WorkflowResult<Handoff> {
        let handoff = self.require(id)?;
        if handoff.status.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                handoff: id,
                from: handoff.status,
                operation: "reject",
            });
        }
        let pair = handoff.pair();
        self.by_pair.remove(&pair);
        let removed = self
            .handoffs
            .remove(&id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Handoff, id))?;
        info!(handoff_id = %id, lost_item_id = %pair.lost, found_item_id = %pair.found, "Handoff removed");
        Ok(removed)
    }

    /// Handoffs matching the filter, newest first
    pub fn list(&self, filter: StatusFilter, assigned_to: Option<&str>) -> Vec<Handoff> {
        let mut handoffs: Vec<Handoff> = self
            .handoffs
            .values()
            .filter(|h| filter.matches(h.status))
            .filter(|h| assigned_to.map_or(true, |who| h.assigned_to.as_deref() == Some(who)))
            .cloned()
            .collect();
        handoffs.sort_by(|a, b| b.initiated_at.cmp(&a.initiated_at).then(b.id.cmp(&a.id)));
        handoffs
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for handoff in self.handoffs.values() {
            summary.record(handoff.status);
        }
        summary
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handoff> {
        self.handoffs.values()
    }
}
