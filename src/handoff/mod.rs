// Handoff tracking
//
// A handoff exists for a (lost, found) pair from the moment a match is
// confirmed until it is rejected. Completed handoffs are kept forever.

pub mod ledger;
pub mod state_machine;
pub mod types;

pub use ledger::HandoffLedger;
pub use state_machine::{available_actions, HandoffAction, HandoffEvent, TransitionOutcome};
pub use types::{
    parse_timestamp, Handoff, HandoffId, HandoffStatus, HandoffUpdate, PairKey, ScheduleRequest,
    StatusFilter, StatusSummary,
};
