// Handoff records and the requests that drive them

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::items::types::parse_prefixed_id;
use crate::items::{FoundItemId, LostItemId};
use crate::workflows::errors::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandoffId(pub u64);

impl fmt::Display for HandoffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl FromStr for HandoffId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed_id(s, 'H').map(HandoffId)
    }
}

/// Composite key of a (lost, found) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub lost: LostItemId,
    pub found: FoundItemId,
}

impl PairKey {
    pub fn new(lost: LostItemId, found: FoundItemId) -> Self {
        Self { lost, found }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lost, self.found)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoffStatus {
    /// Waiting for an operator to set time and place
    Pending,
    /// Time and location agreed
    Scheduled,
    /// Item handed back; terminal
    Completed,
    /// Marked cancelled through a direct edit; can still be edited or rejected
    Cancelled,
}

impl HandoffStatus {
    pub const ALL: [HandoffStatus; 4] = [
        HandoffStatus::Pending,
        HandoffStatus::Scheduled,
        HandoffStatus::Completed,
        HandoffStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffStatus::Pending => "PENDING",
            HandoffStatus::Scheduled => "SCHEDULED",
            HandoffStatus::Completed => "COMPLETED",
            HandoffStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HandoffStatus::Completed)
    }
}

impl fmt::Display for HandoffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandoffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(HandoffStatus::Pending),
            "SCHEDULED" => Ok(HandoffStatus::Scheduled),
            "COMPLETED" => Ok(HandoffStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(HandoffStatus::Cancelled),
            other => Err(format!("unknown handoff status '{other}'")),
        }
    }
}

/// Listing filter; `All` means no filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(HandoffStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: HandoffStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") || s.trim().is_empty() {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl From<HandoffStatus> for StatusFilter {
    fn from(status: HandoffStatus) -> Self {
        StatusFilter::Only(status)
    }
}

/// The tracked physical return of a found item to a lost item's owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub id: HandoffId,
    pub lost_item_id: LostItemId,
    pub found_item_id: FoundItemId,
    pub status: HandoffStatus,
    pub assigned_to: Option<String>,
    pub scheduled_handoff_time: Option<DateTime<Utc>>,
    pub handoff_location: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub initiated_by: String,
    pub initiated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Handoff {
    pub fn pair(&self) -> PairKey {
        PairKey::new(self.lost_item_id, self.found_item_id)
    }

    pub(crate) fn clear_schedule(&mut self) {
        self.assigned_to = None;
        self.scheduled_handoff_time = None;
        self.handoff_location = None;
    }
}

/// Fields for `schedule` and `reschedule`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_handoff_time: DateTime<Utc>,
    pub handoff_location: String,
    pub assigned_to: Option<String>,
}

impl ScheduleRequest {
    pub fn new(time: DateTime<Utc>, location: &str) -> Self {
        Self {
            scheduled_handoff_time: time,
            handoff_location: location.to_string(),
            assigned_to: None,
        }
    }

    pub fn assigned_to(mut self, operator: &str) -> Self {
        self.assigned_to = Some(operator.to_string());
        self
    }
}

/// Generic edit used by direct changes. Optional fields overwrite only when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffUpdate {
    pub status: HandoffStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub scheduled_handoff_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub handoff_location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    /// Operator recorded as `completed_by` when the edit completes the handoff
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl HandoffUpdate {
    pub fn to_status(status: HandoffStatus) -> Self {
        Self {
            status,
            assigned_to: None,
            scheduled_handoff_time: None,
            handoff_location: None,
            notes: None,
            cancellation_reason: None,
            updated_by: None,
        }
    }
}

/// Dashboard counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub pending: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn record(&mut self, status: HandoffStatus) {
        match status {
            HandoffStatus::Pending => self.pending += 1,
            HandoffStatus::Scheduled => self.scheduled += 1,
            HandoffStatus::Completed => self.completed += 1,
            HandoffStatus::Cancelled => self.cancelled += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total,
            StatusFilter::Only(HandoffStatus::Pending) => self.pending,
            StatusFilter::Only(HandoffStatus::Scheduled) => self.scheduled,
            StatusFilter::Only(HandoffStatus::Completed) => self.completed,
            StatusFilter::Only(HandoffStatus::Cancelled) => self.cancelled,
        }
    }
}

/// Parse an ISO-8601 timestamp. Accepts RFC 3339 and minute precision
/// (`2025-05-01T10:00Z`); offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> WorkflowResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(parsed.and_utc());
        }
    }
    Err(WorkflowError::validation(
        "scheduled_handoff_time",
        format!("'{raw}' is not an ISO-8601 timestamp"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-05-01T10:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-05-01T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-05-01T12:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-05-01 10:00").unwrap(), expected);
        assert!(parse_timestamp("next tuesday").is_err());
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("ALL".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "scheduled".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(HandoffStatus::Scheduled))
        );
        assert!("DONE".parse::<StatusFilter>().is_err());
        assert!(StatusFilter::All.matches(HandoffStatus::Completed));
        assert!(!StatusFilter::Only(HandoffStatus::Pending).matches(HandoffStatus::Completed));
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = StatusSummary::default();
        summary.record(HandoffStatus::Pending);
        summary.record(HandoffStatus::Pending);
        summary.record(HandoffStatus::Completed);
        assert_eq!(summary.count(StatusFilter::Only(HandoffStatus::Pending)), 2);
        assert_eq!(summary.count(StatusFilter::Only(HandoffStatus::Scheduled)), 0);
        assert_eq!(summary.count(StatusFilter::All), 3);
    }
}
