// Lostfound Library - Lost & Found Matching and Handoff Workflows
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod database;
pub mod handoff;
pub mod items;
pub mod matching;
pub mod observability;
pub mod persistence;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{config, LostFoundConfig};
pub use handoff::{
    available_actions, Handoff, HandoffAction, HandoffId, HandoffLedger, HandoffStatus,
    HandoffUpdate, ScheduleRequest, StatusFilter, StatusSummary,
};
pub use items::{
    FoundItem, FoundItemId, FoundStatus, ItemStore, LostItem, LostItemId, LostStatus,
    NewFoundItem, NewLostItem,
};
pub use matching::{
    Candidate, FoundItemMatches, FoundMatchView, KeywordMatchIndex, MatchIndex, MatchView,
};
pub use observability::{OperationTimer, WorkflowMetrics, WorkflowStats};
pub use persistence::{JsonFileRepository, StateLock, StateRepository, WorkflowSnapshot};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflows::{ErrorKind, WorkflowCoordinator, WorkflowError, WorkflowResult, WorkflowState};

#[cfg(feature = "database")]
pub use database::SqliteStateRepository;
