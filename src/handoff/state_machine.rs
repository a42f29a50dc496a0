// Handoff lifecycle transitions
//
//   PENDING --schedule--> SCHEDULED --complete--> COMPLETED
//                         SCHEDULED --reschedule--> SCHEDULED
//                         SCHEDULED --cancel--> PENDING
//
// The generic `Update` event reaches every status, CANCELLED included, under
// the same field-presence rules. Nothing leaves COMPLETED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::types::*;
use crate::workflows::errors::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffEvent {
    Schedule(ScheduleRequest),
    Reschedule(ScheduleRequest),
    Cancel,
    Complete { completed_by: Option<String> },
    Update(HandoffUpdate),
}

impl HandoffEvent {
    pub fn operation(&self) -> &'static str {
        match self {
            HandoffEvent::Schedule(_) => "schedule",
            HandoffEvent::Reschedule(_) => "reschedule",
            HandoffEvent::Cancel => "cancel",
            HandoffEvent::Complete { .. } => "complete",
            HandoffEvent::Update(_) => "update",
        }
    }
}

/// Operator actions offered for a handoff in a given status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffAction {
    Schedule,
    Reschedule,
    Cancel,
    Complete,
    Update,
    Reject,
}

pub fn available_actions(status: HandoffStatus) -> &'static [HandoffAction] {
    match status {
        HandoffStatus::Pending => &[HandoffAction::Schedule, HandoffAction::Update, HandoffAction::Reject],
        HandoffStatus::Scheduled => &[
            HandoffAction::Reschedule,
            HandoffAction::Cancel,
            HandoffAction::Complete,
            HandoffAction::Update,
            HandoffAction::Reject,
        ],
        HandoffStatus::Cancelled => &[HandoffAction::Update, HandoffAction::Reject],
        HandoffStatus::Completed => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub from: HandoffStatus,
    pub to: HandoffStatus,
}

impl TransitionOutcome {
    /// Completion is the only transition with item side effects
    pub fn returns_items(&self) -> bool {
        self.to == HandoffStatus::Completed && self.from != HandoffStatus::Completed
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_location(location: &str) -> WorkflowResult<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(WorkflowError::validation("handoff_location", "must not be empty"));
    }
    Ok(location.to_string())
}

fn invalid(handoff: &Handoff, event: &HandoffEvent) -> WorkflowError {
    WorkflowError::InvalidTransition {
        handoff: handoff.id,
        from: handoff.status,
        operation: event.operation(),
    }
}

/// Apply an event to a handoff. Every rule is checked before the record is
/// touched, so an error leaves the handoff exactly as it was.
pub fn apply(handoff: &mut Handoff, event: HandoffEvent, now: DateTime<Utc>) -> WorkflowResult<TransitionOutcome> {
    let from = handoff.status;
    if from.is_terminal() {
        return Err(invalid(handoff, &event));
    }

    match &event {
        HandoffEvent::Schedule(request) | HandoffEvent::Reschedule(request) => {
            let required = if matches!(event, HandoffEvent::Schedule(_)) {
                HandoffStatus::Pending
            } else {
                HandoffStatus::Scheduled
            };
            if from != required {
                return Err(invalid(handoff, &event));
            }
            let location = require_location(&request.handoff_location)?;
            handoff.scheduled_handoff_time = Some(request.scheduled_handoff_time);
            handoff.handoff_location = Some(location);
            handoff.assigned_to = normalize(request.assigned_to.clone());
            handoff.status = HandoffStatus::Scheduled;
        }
        HandoffEvent::Cancel => {
            if from != HandoffStatus::Scheduled {
                return Err(invalid(handoff, &event));
            }
            handoff.clear_schedule();
            handoff.cancellation_reason = None;
            handoff.status = HandoffStatus::Pending;
        }
        HandoffEvent::Complete { completed_by } => {
            if from != HandoffStatus::Scheduled {
                return Err(invalid(handoff, &event));
            }
            handoff.completed_by = normalize(completed_by.clone());
            handoff.completed_at = Some(now);
            handoff.status = HandoffStatus::Completed;
        }
        HandoffEvent::Update(update) => apply_update(handoff, update, now)?,
    }

    handoff.updated_at = now;
    let outcome = TransitionOutcome {
        from,
        to: handoff.status,
    };
    info!(
        handoff_id = %handoff.id,
        operation = event.operation(),
        from = %outcome.from,
        to = %outcome.to,
        "Handoff transition applied"
    );
    Ok(outcome)
}

fn apply_update(
    handoff: &mut Handoff,
    update: &HandoffUpdate,
    now: DateTime<Utc>,
) -> WorkflowResult<()> {
    let from = handoff.status;

    let location = match &update.handoff_location {
        Some(raw) if update.status == HandoffStatus::Scheduled => Some(require_location(raw)?),
        other => normalize(other.clone()),
    };
    match update.status {
        HandoffStatus::Scheduled => {
            if update.scheduled_handoff_time.or(handoff.scheduled_handoff_time).is_none() {
                return Err(WorkflowError::MissingField {
                    handoff: handoff.id,
                    status: HandoffStatus::Scheduled,
                    field: "scheduled_handoff_time",
                });
            }
            if location.is_none() && handoff.handoff_location.is_none() {
                return Err(WorkflowError::MissingField {
                    handoff: handoff.id,
                    status: HandoffStatus::Scheduled,
                    field: "handoff_location",
                });
            }
        }
        HandoffStatus::Completed => {
            if from != HandoffStatus::Scheduled {
                return Err(WorkflowError::InvalidTransition {
                    handoff: handoff.id,
                    from,
                    operation: "complete",
                });
            }
        }
        HandoffStatus::Pending | HandoffStatus::Cancelled => {}
    }

    if update.assigned_to.is_some() {
        handoff.assigned_to = normalize(update.assigned_to.clone());
    }
    if let Some(time) = update.scheduled_handoff_time {
        handoff.scheduled_handoff_time = Some(time);
    }
    if location.is_some() {
        handoff.handoff_location = location;
    }
    if update.notes.is_some() {
        handoff.notes = normalize(update.notes.clone());
    }

    match update.status {
        HandoffStatus::Cancelled => {
            if update.cancellation_reason.is_some() {
                handoff.cancellation_reason = normalize(update.cancellation_reason.clone());
            }
        }
        HandoffStatus::Completed => {
            handoff.completed_by = normalize(update.updated_by.clone());
            handoff.completed_at = Some(now);
            handoff.cancellation_reason = None;
        }
        HandoffStatus::Pending | HandoffStatus::Scheduled => {
            handoff.cancellation_reason = None;
        }
    }
    handoff.status = update.status;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{FoundItemId, LostItemId};
    use crate::workflows::errors::ErrorKind;
    use chrono::TimeZone;

    fn pending() -> Handoff {
        let now = Utc.with_ymd_and_hms(2025, 4, 28, 9, 0, 0).unwrap();
        Handoff {
            id: HandoffId(1),
            lost_item_id: LostItemId(1),
            found_item_id: FoundItemId(1),
            status: HandoffStatus::Pending,
            assigned_to: None,
            scheduled_handoff_time: None,
            handoff_location: None,
            notes: None,
            cancellation_reason: None,
            initiated_by: "system".to_string(),
            initiated_at: now,
            updated_at: now,
            completed_by: None,
            completed_at: None,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap()
    }

    fn scheduled() -> Handoff {
        let mut handoff = pending();
        apply(
            &mut handoff,
            HandoffEvent::Schedule(ScheduleRequest::new(at(10), "Main Office").assigned_to("ops1")),
            at(8),
        )
        .unwrap();
        handoff
    }

    #[test]
    fn test_schedule_from_pending() {
        let handoff = scheduled();
        assert_eq!(handoff.status, HandoffStatus::Scheduled);
        assert_eq!(handoff.scheduled_handoff_time, Some(at(10)));
        assert_eq!(handoff.handoff_location.as_deref(), Some("Main Office"));
        assert_eq!(handoff.assigned_to.as_deref(), Some("ops1"));
        assert_eq!(handoff.updated_at, at(8));
    }

    #[test]
    fn test_schedule_with_blank_location_leaves_pending() {
        let mut handoff = pending();
        let before = handoff.clone();
        let err = apply(
            &mut handoff,
            HandoffEvent::Schedule(ScheduleRequest::new(at(10), "   ")),
            at(8),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(handoff, before);
    }

    #[test]
    fn test_schedule_requires_pending() {
        let mut handoff = scheduled();
        let err = apply(
            &mut handoff,
            HandoffEvent::Schedule(ScheduleRequest::new(at(11), "Library")),
            at(9),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(handoff.handoff_location.as_deref(), Some("Main Office"));
    }

    #[test]
    fn test_reschedule_overwrites_schedule_fields() {
        let mut handoff = scheduled();
        apply(
            &mut handoff,
            HandoffEvent::Reschedule(ScheduleRequest::new(at(14), "Library Desk")),
            at(9),
        )
        .unwrap();
        assert_eq!(handoff.status, HandoffStatus::Scheduled);
        assert_eq!(handoff.scheduled_handoff_time, Some(at(14)));
        assert_eq!(handoff.handoff_location.as_deref(), Some("Library Desk"));
        assert_eq!(handoff.assigned_to, None);
    }

    #[test]
    fn test_reschedule_requires_scheduled() {
        let mut handoff = pending();
        let err = apply(
            &mut handoff,
            HandoffEvent::Reschedule(ScheduleRequest::new(at(14), "Library Desk")),
            at(9),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_cancel_returns_to_pending_and_clears_schedule() {
        let mut handoff = scheduled();
        handoff.cancellation_reason = Some("stale".to_string());
        let outcome = apply(&mut handoff, HandoffEvent::Cancel, at(9)).unwrap();
        assert_eq!(outcome.from, HandoffStatus::Scheduled);
        assert_eq!(outcome.to, HandoffStatus::Pending);
        assert_eq!(handoff.assigned_to, None);
        assert_eq!(handoff.scheduled_handoff_time, None);
        assert_eq!(handoff.handoff_location, None);
        assert_eq!(handoff.cancellation_reason, None);
    }

    #[test]
    fn test_cancel_requires_scheduled() {
        let mut handoff = pending();
        assert!(apply(&mut handoff, HandoffEvent::Cancel, at(9)).is_err());
    }

    #[test]
    fn test_complete_is_not_idempotent() {
        let mut handoff = scheduled();
        let outcome = apply(
            &mut handoff,
            HandoffEvent::Complete { completed_by: Some("ops1".to_string()) },
            at(10),
        )
        .unwrap();
        assert!(outcome.returns_items());
        assert_eq!(handoff.completed_at, Some(at(10)));
        assert_eq!(handoff.completed_by.as_deref(), Some("ops1"));

        let err = apply(&mut handoff, HandoffEvent::Complete { completed_by: None }, at(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(handoff.completed_at, Some(at(10)));
    }

    #[test]
    fn test_complete_requires_scheduled() {
        let mut handoff = pending();
        let err = apply(&mut handoff, HandoffEvent::Complete { completed_by: None }, at(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(handoff.status, HandoffStatus::Pending);
    }

    #[test]
    fn test_update_to_scheduled_needs_time_and_location() {
        let mut handoff = pending();
        let mut update = HandoffUpdate::to_status(HandoffStatus::Scheduled);
        update.handoff_location = Some("Main Office".to_string());
        let err = apply(&mut handoff, HandoffEvent::Update(update.clone()), at(9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(handoff.handoff_location, None);

        update.scheduled_handoff_time = Some(at(10));
        apply(&mut handoff, HandoffEvent::Update(update), at(9)).unwrap();
        assert_eq!(handoff.status, HandoffStatus::Scheduled);
    }

    #[test]
    fn test_update_to_scheduled_with_blank_location_is_validation_error() {
        let mut handoff = pending();
        let mut update = HandoffUpdate::to_status(HandoffStatus::Scheduled);
        update.scheduled_handoff_time = Some(at(10));
        update.handoff_location = Some(" ".to_string());
        let err = apply(&mut handoff, HandoffEvent::Update(update), at(9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_update_to_cancelled_is_distinct_from_cancel() {
        let mut handoff = scheduled();
        let mut update = HandoffUpdate::to_status(HandoffStatus::Cancelled);
        update.cancellation_reason = Some("Owner left campus".to_string());
        apply(&mut handoff, HandoffEvent::Update(update), at(9)).unwrap();

        assert_eq!(handoff.status, HandoffStatus::Cancelled);
        assert_eq!(handoff.cancellation_reason.as_deref(), Some("Owner left campus"));
        // schedule fields are kept, unlike the named cancel
        assert_eq!(handoff.handoff_location.as_deref(), Some("Main Office"));
        assert_eq!(available_actions(handoff.status), &[HandoffAction::Update, HandoffAction::Reject]);

        // and it can be brought back
        apply(
            &mut handoff,
            HandoffEvent::Update(HandoffUpdate::to_status(HandoffStatus::Scheduled)),
            at(10),
        )
        .unwrap();
        assert_eq!(handoff.status, HandoffStatus::Scheduled);
        assert_eq!(handoff.cancellation_reason, None);
    }

    #[test]
    fn test_update_to_completed_requires_scheduled() {
        let mut handoff = pending();
        let err = apply(
            &mut handoff,
            HandoffEvent::Update(HandoffUpdate::to_status(HandoffStatus::Completed)),
            at(9),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let mut handoff = scheduled();
        let outcome = apply(
            &mut handoff,
            HandoffEvent::Update(HandoffUpdate::to_status(HandoffStatus::Completed)),
            at(9),
        )
        .unwrap();
        assert!(outcome.returns_items());
    }

    #[test]
    fn test_completed_is_frozen() {
        let mut handoff = scheduled();
        apply(&mut handoff, HandoffEvent::Complete { completed_by: None }, at(10)).unwrap();
        let frozen = handoff.clone();
        let mut update = HandoffUpdate::to_status(HandoffStatus::Completed);
        update.notes = Some("late note".to_string());
        assert!(apply(&mut handoff, HandoffEvent::Update(update), at(11)).is_err());
        assert!(apply(
            &mut handoff,
            HandoffEvent::Reschedule(ScheduleRequest::new(at(12), "Gym")),
            at(11)
        )
        .is_err());
        assert_eq!(handoff, frozen);
        assert!(available_actions(HandoffStatus::Completed).is_empty());
    }
}
