use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::handoff::{HandoffId, HandoffLedger, PairKey};
use crate::items::{FoundItem, FoundItemId, FoundStatus, ItemStore, LostItem, LostItemId, LostStatus};
use crate::workflows::errors::WorkflowResult;

/// Raw oracle output for one lost item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub lost_item_id: LostItemId,
    pub confidence_score: u32,
    pub reason: String,
}

/// Scoring oracle consumed by the workflow. Implementations must be pure:
/// repeated calls with the same inputs give the same answer and touch nothing.
#[cfg_attr(test, mockall::automock)]
pub trait MatchIndex: Send + Sync {
    fn find_candidates(&self, found: &FoundItem, lost_items: &[LostItem]) -> Vec<Candidate>;
}

/// A lost item surfaced for a found item, joined with handoff state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub lost_item: LostItem,
    pub confidence_score: u8,
    pub reason: String,
    pub confirmed: bool,
    pub handoff_id: Option<HandoffId>,
}

/// A found item surfaced for a lost item, joined with handoff state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundMatchView {
    pub found_item: FoundItem,
    pub confidence_score: u8,
    pub reason: String,
    pub confirmed: bool,
    pub handoff_id: Option<HandoffId>,
}

/// One row of the matches dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundItemMatches {
    pub found_item: FoundItem,
    pub matches: Vec<MatchView>,
    pub total_matches: usize,
    pub confirmed_matches: usize,
}

pub(crate) const MANUAL_REASON: &str = "Confirmed manually";

fn clamp(score: u32) -> u8 {
    score.min(100) as u8
}

/// Scores every eligible lost item against one found item. Returns
/// (lost id -> (score, reason)), keeping the best score per lost item.
fn score_found(
    index: &dyn MatchIndex,
    ledger: &HandoffLedger,
    found: &FoundItem,
    lost_items: &[&LostItem],
) -> HashMap<LostItemId, (u8, String)> {
    let eligible: Vec<LostItem> = lost_items
        .iter()
        .filter(|lost| {
            let confirmed = ledger.is_confirmed(PairKey::new(lost.id, found.id));
            confirmed
                || (lost.status != LostStatus::Returned && found.status != FoundStatus::Returned)
        })
        .map(|lost| (*lost).clone())
        .collect();
    if eligible.is_empty() {
        return HashMap::new();
    }

    let mut scored: HashMap<LostItemId, (u8, String)> = HashMap::new();
    for candidate in index.find_candidates(found, &eligible) {
        if !eligible.iter().any(|lost| lost.id == candidate.lost_item_id) {
            continue;
        }
        let score = clamp(candidate.confidence_score);
        match scored.get(&candidate.lost_item_id) {
            Some((best, _)) if *best >= score => {}
            _ => {
                scored.insert(candidate.lost_item_id, (score, candidate.reason));
            }
        }
    }
    scored
}

/// Candidates for a found item, best first, ties broken by most recent lost item.
/// Confirmed pairs always appear; `min_score` only trims unconfirmed ones.
pub fn candidates_for_found(
    index: &dyn MatchIndex,
    items: &ItemStore,
    ledger: &HandoffLedger,
    found_id: FoundItemId,
    min_score: u8,
) -> WorkflowResult<Vec<MatchView>> {
    let found = items.require_found(found_id)?;
    let lost_items: Vec<&LostItem> = items.lost_items().collect();
    let mut scored = score_found(index, ledger, found, &lost_items);

    for handoff in ledger.for_found(found_id) {
        scored
            .entry(handoff.lost_item_id)
            .or_insert_with(|| (0, MANUAL_REASON.to_string()));
    }

    let mut views: Vec<MatchView> = scored
        .into_iter()
        .filter_map(|(lost_id, (score, reason))| {
            let lost_item = items.lost(lost_id)?.clone();
            let handoff_id = ledger.live_for_pair(PairKey::new(lost_id, found_id)).map(|h| h.id);
            let confirmed = handoff_id.is_some();
            (confirmed || score >= min_score).then_some(MatchView {
                lost_item,
                confidence_score: score,
                reason,
                confirmed,
                handoff_id,
            })
        })
        .collect();
    views.sort_by(|a, b| {
        b.confidence_score
            .cmp(&a.confidence_score)
            .then(b.lost_item.reported_at.cmp(&a.lost_item.reported_at))
            .then(b.lost_item.id.cmp(&a.lost_item.id))
    });
    Ok(views)
}

/// Candidates for a lost item: every found item whose oracle run surfaces it
pub fn candidates_for_lost(
    index: &dyn MatchIndex,
    items: &ItemStore,
    ledger: &HandoffLedger,
    lost_id: LostItemId,
    min_score: u8,
) -> WorkflowResult<Vec<FoundMatchView>> {
    let lost = items.require_lost(lost_id)?;
    let mut views = Vec::new();

    for found in items.found_items() {
        let pair = PairKey::new(lost_id, found.id);
        let handoff_id = ledger.live_for_pair(pair).map(|h| h.id);
        let scored = score_found(index, ledger, found, &[lost]);
        let (score, reason) = match (scored.get(&lost_id), handoff_id) {
            (Some((score, reason)), _) => (*score, reason.clone()),
            (None, Some(_)) => (0, MANUAL_REASON.to_string()),
            (None, None) => continue,
        };
        if handoff_id.is_none() && score < min_score {
            continue;
        }
        views.push(FoundMatchView {
            found_item: found.clone(),
            confidence_score: score,
            reason,
            confirmed: handoff_id.is_some(),
            handoff_id,
        });
    }

    views.sort_by(|a, b| {
        b.confidence_score
            .cmp(&a.confidence_score)
            .then(b.found_item.reported_at.cmp(&a.found_item.reported_at))
            .then(b.found_item.id.cmp(&a.found_item.id))
    });
    Ok(views)
}

/// Every found item with its candidates, newest found item first
pub fn matches_overview(
    index: &dyn MatchIndex,
    items: &ItemStore,
    ledger: &HandoffLedger,
    min_score: u8,
) -> WorkflowResult<Vec<FoundItemMatches>> {
    items
        .list_found(None)
        .into_iter()
        .map(|found_item| {
            let matches = candidates_for_found(index, items, ledger, found_item.id, min_score)?;
            let confirmed_matches = matches.iter().filter(|m| m.confirmed).count();
            Ok(FoundItemMatches {
                total_matches: matches.len(),
                confirmed_matches,
                found_item,
                matches,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{NewFoundItem, NewLostItem};
    use crate::workflows::errors::ErrorKind;
    use chrono::{Duration, Utc};

    fn store_with(lost: usize) -> ItemStore {
        let mut store = ItemStore::new();
        let t0 = Utc::now();
        for i in 0..lost {
            store
                .report_lost(NewLostItem::titled(&format!("Lost {i}")), t0 + Duration::minutes(i as i64))
                .unwrap();
        }
        store.report_found(NewFoundItem::titled("Found"), t0).unwrap();
        store
    }

    fn fixed(scores: Vec<(u64, u32)>) -> MockMatchIndex {
        let mut index = MockMatchIndex::new();
        index.expect_find_candidates().returning(move |_, _| {
            scores
                .iter()
                .map(|(id, score)| Candidate {
                    lost_item_id: LostItemId(*id),
                    confidence_score: *score,
                    reason: format!("score {score}"),
                })
                .collect()
        });
        index
    }

    #[test]
    fn test_scores_are_clamped_and_ordered() {
        let store = store_with(3);
        let index = fixed(vec![(1, 40), (2, 250), (3, 40)]);
        let views = candidates_for_found(&index, &store, &HandoffLedger::new(), FoundItemId(1), 0).unwrap();

        let order: Vec<(LostItemId, u8)> = views.iter().map(|v| (v.lost_item.id, v.confidence_score)).collect();
        // L3 reported after L1, so it wins the tie
        assert_eq!(
            order,
            vec![(LostItemId(2), 100), (LostItemId(3), 40), (LostItemId(1), 40)]
        );
        assert!(views.iter().all(|v| !v.confirmed));
    }

    #[test]
    fn test_confirmed_flag_comes_from_ledger() {
        let store = store_with(2);
        let mut ledger = HandoffLedger::new();
        let handoff = ledger
            .open(PairKey::new(LostItemId(2), FoundItemId(1)), "ops", None, Utc::now())
            .unwrap();
        let index = fixed(vec![(1, 80)]);

        let views = candidates_for_found(&index, &store, &ledger, FoundItemId(1), 50).unwrap();
        assert_eq!(views.len(), 2);
        assert!(!views[0].confirmed);
        // the oracle missed the confirmed pair but it stays visible
        assert_eq!(views[1].lost_item.id, LostItemId(2));
        assert!(views[1].confirmed);
        assert_eq!(views[1].handoff_id, Some(handoff.id));
        assert_eq!(views[1].reason, MANUAL_REASON);
    }

    #[test]
    fn test_min_score_trims_unconfirmed_only() {
        let store = store_with(2);
        let index = fixed(vec![(1, 10), (2, 90)]);
        let views = candidates_for_found(&index, &store, &HandoffLedger::new(), FoundItemId(1), 50).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].lost_item.id, LostItemId(2));
    }

    #[test]
    fn test_returned_lost_items_are_not_offered() {
        let mut store = store_with(2);
        store.set_lost_status(LostItemId(1), LostStatus::Returned).unwrap();
        let mut index = MockMatchIndex::new();
        index
            .expect_find_candidates()
            .withf(|_, lost| lost.len() == 1 && lost[0].id == LostItemId(2))
            .times(1)
            .returning(|_, _| Vec::new());
        let views = candidates_for_found(&index, &store, &HandoffLedger::new(), FoundItemId(1), 0).unwrap();
        assert!(views.is_empty());
    }

    #[test]
    fn test_candidates_for_lost_and_overview() {
        let store = store_with(1);
        let index = fixed(vec![(1, 70)]);
        let ledger = HandoffLedger::new();

        let views = candidates_for_lost(&index, &store, &ledger, LostItemId(1), 0).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].found_item.id, FoundItemId(1));
        assert_eq!(views[0].confidence_score, 70);

        let overview = matches_overview(&index, &store, &ledger, 0).unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].total_matches, 1);
        assert_eq!(overview[0].confirmed_matches, 0);
    }

    #[test]
    fn test_unknown_items_are_not_found() {
        let store = store_with(1);
        let index = fixed(Vec::new());
        let err = candidates_for_found(&index, &store, &HandoffLedger::new(), FoundItemId(9), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = candidates_for_lost(&index, &store, &HandoffLedger::new(), LostItemId(9), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
