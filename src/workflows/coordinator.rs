// Workflow coordinator - the single entry point for state-changing commands
//
// Every command runs against a clone of the committed state. The draft is
// persisted first and only then swapped in, so a failed rule check or a failed
// save leaves the committed state untouched. One async mutex serializes all
// commands, which also serializes every mutation of a given handoff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use super::errors::{ErrorKind, WorkflowError, WorkflowResult};
use crate::handoff::{
    Handoff, HandoffEvent, HandoffId, HandoffLedger, HandoffUpdate, PairKey, ScheduleRequest,
    StatusFilter, StatusSummary,
};
use crate::items::{
    FoundItem, FoundItemId, FoundStatus, ItemStore, LostItem, LostItemId, LostStatus,
    NewFoundItem, NewLostItem,
};
use crate::matching::{self, FoundItemMatches, FoundMatchView, KeywordMatchIndex, MatchIndex, MatchView};
use crate::observability::{OperationTimer, WorkflowMetrics};
use crate::persistence::{StateRepository, WorkflowSnapshot};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

pub const DEFAULT_OPERATOR: &str = "system";
pub const AUTO_CREATED_NOTE: &str = "Auto-created from confirmed match";

/// Everything a command may change, committed as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub items: ItemStore,
    pub ledger: HandoffLedger,
}

impl WorkflowState {
    fn confirm(&mut self, lost_id: LostItemId, found_id: FoundItemId, operator: &str, now: DateTime<Utc>) -> WorkflowResult<Handoff> {
        let lost = self.items.require_lost(lost_id)?;
        if lost.status == LostStatus::Returned {
            return Err(WorkflowError::conflict(format!("lost item {lost_id} has already been returned")));
        }
        let found = self.items.require_found(found_id)?;
        if found.status == FoundStatus::Returned {
            return Err(WorkflowError::conflict(format!("found item {found_id} has already been returned")));
        }

        let handoff = self.ledger.open(
            PairKey::new(lost_id, found_id),
            operator,
            Some(AUTO_CREATED_NOTE.to_string()),
            now,
        )?;
        self.items.set_lost_status(lost_id, LostStatus::Matched)?;
        self.items.set_found_status(found_id, FoundStatus::Matched)?;
        Ok(handoff)
    }

    /// Each side reopens only when no other live handoff still holds it
    fn reject(&mut self, id: HandoffId) -> WorkflowResult<Handoff> {
        let removed = self.ledger.remove(id)?;
        if self.ledger.for_lost(removed.lost_item_id).next().is_none() {
            self.items.set_lost_status(removed.lost_item_id, LostStatus::Open)?;
        }
        if self.ledger.for_found(removed.found_item_id).next().is_none() {
            self.items.set_found_status(removed.found_item_id, FoundStatus::Unclaimed)?;
        }
        Ok(removed)
    }

    fn transition(&mut self, id: HandoffId, event: HandoffEvent, now: DateTime<Utc>) -> WorkflowResult<Handoff> {
        let (handoff, outcome) = self.ledger.apply(id, event, now)?;
        if outcome.returns_items() {
            self.items.set_lost_status(handoff.lost_item_id, LostStatus::Returned)?;
            self.items.set_found_status(handoff.found_item_id, FoundStatus::Returned)?;
            info!(
                handoff_id = %handoff.id,
                lost_item_id = %handoff.lost_item_id,
                found_item_id = %handoff.found_item_id,
                "Items returned to owner"
            );
        }
        Ok(handoff)
    }
}

#[derive(Clone)]
pub struct WorkflowCoordinator {
    state: Arc<Mutex<WorkflowState>>,
    index: Arc<dyn MatchIndex>,
    repository: Option<Arc<dyn StateRepository>>,
    metrics: Arc<WorkflowMetrics>,
    min_score: u8,
}

impl Default for WorkflowCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowCoordinator {
    /// In-memory coordinator with the keyword oracle
    pub fn new() -> Self {
        Self::from_state(WorkflowState::default())
    }

    pub fn from_state(state: WorkflowState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            index: Arc::new(KeywordMatchIndex::new()),
            repository: None,
            metrics: Arc::new(WorkflowMetrics::new()),
            min_score: 0,
        }
    }

    /// Coordinator backed by a repository, starting from its latest snapshot
    pub async fn open(repository: Arc<dyn StateRepository>) -> WorkflowResult<Self> {
        let state = match repository.load().await? {
            Some(snapshot) => snapshot.state,
            None => WorkflowState::default(),
        };
        let mut coordinator = Self::from_state(state);
        coordinator.repository = Some(repository);
        Ok(coordinator)
    }

    pub fn with_index(mut self, index: Arc<dyn MatchIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn StateRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Unconfirmed candidates scoring below this are hidden
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score.min(100);
        self
    }

    pub fn metrics(&self) -> &WorkflowMetrics {
        &self.metrics
    }

    async fn transact<T, F>(&self, operation: &'static str, mutate: F) -> WorkflowResult<T>
    where
        F: FnOnce(&mut WorkflowState, DateTime<Utc>) -> WorkflowResult<T> + Send,
        T: Send,
    {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(operation, &correlation_id);
        async move {
            let timer = OperationTimer::new(operation);
            let mut committed = self.state.lock().await;
            let mut draft = committed.clone();
            let now = Utc::now();

            let value = match mutate(&mut draft, now) {
                Ok(value) => value,
                Err(err) => {
                    self.metrics.record_failure(err.kind());
                    warn!(operation, kind = ?err.kind(), error = %err, "Workflow command rejected");
                    return Err(err);
                }
            };

            if let Some(repository) = &self.repository {
                let snapshot = WorkflowSnapshot::new(draft, now);
                if let Err(err) = repository.save(&snapshot).await {
                    self.metrics.record_failure(ErrorKind::Internal);
                    warn!(operation, error = %err, "Commit failed, state left unchanged");
                    return Err(err.into());
                }
                *committed = snapshot.state;
            } else {
                *committed = draft;
            }

            self.metrics.record_success(operation);
            timer.finish();
            Ok(value)
        }
        .instrument(span)
        .await
    }

    async fn read<T>(&self, query: impl FnOnce(&WorkflowState) -> T) -> T {
        let state = self.state.lock().await;
        query(&state)
    }

    pub async fn report_lost(&self, report: NewLostItem) -> WorkflowResult<LostItem> {
        self.transact("report_lost", move |state, now| state.items.report_lost(report, now))
            .await
    }

    pub async fn report_found(&self, report: NewFoundItem) -> WorkflowResult<FoundItem> {
        self.transact("report_found", move |state, now| state.items.report_found(report, now))
            .await
    }

    /// Confirm a (lost, found) pair: opens a PENDING handoff and marks both items MATCHED
    pub async fn confirm_match(
        &self,
        lost_id: LostItemId,
        found_id: FoundItemId,
        operator: Option<&str>,
    ) -> WorkflowResult<Handoff> {
        let operator = operator
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(DEFAULT_OPERATOR)
            .to_string();
        self.transact("confirm_match", move |state, now| {
            state.confirm(lost_id, found_id, &operator, now)
        })
        .await
    }

    /// Delete a non-completed handoff. Returns the removed record.
    pub async fn reject_match(&self, id: HandoffId) -> WorkflowResult<Handoff> {
        self.transact("reject_match", move |state, _| state.reject(id)).await
    }

    pub async fn schedule(&self, id: HandoffId, request: ScheduleRequest) -> WorkflowResult<Handoff> {
        self.transact("schedule", move |state, now| {
            state.transition(id, HandoffEvent::Schedule(request), now)
        })
        .await
    }

    pub async fn reschedule(&self, id: HandoffId, request: ScheduleRequest) -> WorkflowResult<Handoff> {
        self.transact("reschedule", move |state, now| {
            state.transition(id, HandoffEvent::Reschedule(request), now)
        })
        .await
    }

    /// Back to PENDING with the schedule cleared
    pub async fn cancel(&self, id: HandoffId) -> WorkflowResult<Handoff> {
        self.transact("cancel", move |state, now| {
            state.transition(id, HandoffEvent::Cancel, now)
        })
        .await
    }

    pub async fn complete(&self, id: HandoffId, operator: Option<&str>) -> WorkflowResult<Handoff> {
        let completed_by = operator.map(str::to_string);
        self.transact("complete", move |state, now| {
            state.transition(id, HandoffEvent::Complete { completed_by }, now)
        })
        .await
    }

    /// Generic edit; the same field rules as the named operations apply
    pub async fn update(&self, id: HandoffId, update: HandoffUpdate) -> WorkflowResult<Handoff> {
        self.transact("update", move |state, now| {
            state.transition(id, HandoffEvent::Update(update), now)
        })
        .await
    }

    pub async fn handoff(&self, id: HandoffId) -> WorkflowResult<Handoff> {
        self.read(|state| state.ledger.require(id).cloned()).await
    }

    pub async fn list_handoffs(&self, filter: StatusFilter, assigned_to: Option<&str>) -> Vec<Handoff> {
        self.read(|state| state.ledger.list(filter, assigned_to)).await
    }

    pub async fn status_summary(&self) -> StatusSummary {
        self.read(|state| state.ledger.summary()).await
    }

    pub async fn lost_item(&self, id: LostItemId) -> WorkflowResult<LostItem> {
        self.read(|state| state.items.require_lost(id).cloned()).await
    }

    pub async fn found_item(&self, id: FoundItemId) -> WorkflowResult<FoundItem> {
        self.read(|state| state.items.require_found(id).cloned()).await
    }

    pub async fn list_lost(&self, status: Option<LostStatus>, owner: Option<&str>) -> Vec<LostItem> {
        self.read(|state| state.items.list_lost(status, owner)).await
    }

    pub async fn list_found(&self, status: Option<FoundStatus>) -> Vec<FoundItem> {
        self.read(|state| state.items.list_found(status)).await
    }

    pub async fn candidates_for_found(&self, id: FoundItemId) -> WorkflowResult<Vec<MatchView>> {
        self.read(|state| {
            matching::candidates_for_found(self.index.as_ref(), &state.items, &state.ledger, id, self.min_score)
        })
        .await
    }

    pub async fn candidates_for_lost(&self, id: LostItemId) -> WorkflowResult<Vec<FoundMatchView>> {
        self.read(|state| {
            matching::candidates_for_lost(self.index.as_ref(), &state.items, &state.ledger, id, self.min_score)
        })
        .await
    }

    pub async fn matches_overview(&self) -> WorkflowResult<Vec<FoundItemMatches>> {
        self.read(|state| {
            matching::matches_overview(self.index.as_ref(), &state.items, &state.ledger, self.min_score)
        })
        .await
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> WorkflowState {
        self.read(WorkflowState::clone).await
    }
}
