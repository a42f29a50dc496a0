// Core types for lost and found reports

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a lost item report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LostItemId(pub u64);

/// Identity of a found item report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundItemId(pub u64);

impl fmt::Display for LostItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for FoundItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

/// Parse `L7`, `l7` or plain `7` style identifiers
pub(crate) fn parse_prefixed_id(raw: &str, prefix: char) -> Result<u64, String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(prefix)
        .or_else(|| trimmed.strip_prefix(prefix.to_ascii_lowercase()))
        .unwrap_or(trimmed);
    digits
        .parse()
        .map_err(|_| format!("'{raw}' is not a valid {prefix}-id"))
}

impl FromStr for LostItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed_id(s, 'L').map(LostItemId)
    }
}

impl FromStr for FoundItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed_id(s, 'F').map(FoundItemId)
    }
}

/// Lifecycle of a lost item report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LostStatus {
    /// Reported, no confirmed match yet
    Open,
    /// At least one live handoff references this item
    Matched,
    /// Handed back to the owner
    Returned,
}

/// Lifecycle of a found item report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoundStatus {
    /// Turned in, nobody has claimed it yet
    Unclaimed,
    Matched,
    Returned,
}

impl LostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LostStatus::Open => "OPEN",
            LostStatus::Matched => "MATCHED",
            LostStatus::Returned => "RETURNED",
        }
    }
}

impl FoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoundStatus::Unclaimed => "UNCLAIMED",
            FoundStatus::Matched => "MATCHED",
            FoundStatus::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for LostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(LostStatus::Open),
            "MATCHED" => Ok(LostStatus::Matched),
            "RETURNED" => Ok(LostStatus::Returned),
            other => Err(format!("unknown lost item status '{other}'")),
        }
    }
}

impl FromStr for FoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNCLAIMED" => Ok(FoundStatus::Unclaimed),
            "MATCHED" => Ok(FoundStatus::Matched),
            "RETURNED" => Ok(FoundStatus::Returned),
            other => Err(format!("unknown found item status '{other}'")),
        }
    }
}

/// A report of something missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostItem {
    pub id: LostItemId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub location: Option<String>,
    pub date_lost: Option<NaiveDate>,
    pub image_ref: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    /// Account that filed the report, used for "my reports" listings
    pub reported_by: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub status: LostStatus,
}

/// A report of something turned in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundItem {
    pub id: FoundItemId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub location: Option<String>,
    pub date_found: Option<NaiveDate>,
    pub image_ref: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub reported_by: Option<String>,
    pub reported_at: DateTime<Utc>,
    pub status: FoundStatus,
}

/// Report submission for a lost item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLostItem {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub location: Option<String>,
    pub date_lost: Option<NaiveDate>,
    pub image_ref: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub reported_by: Option<String>,
}

/// Report submission for a found item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFoundItem {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub location: Option<String>,
    pub date_found: Option<NaiveDate>,
    pub image_ref: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub reported_by: Option<String>,
}

impl NewLostItem {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

impl NewFoundItem {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}
