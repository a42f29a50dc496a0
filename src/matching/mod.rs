// Candidate matching
//
// The oracle only scores; whether a pair is confirmed is always read from the
// handoff ledger at query time.

pub mod index;
pub mod keyword;

pub use index::{
    candidates_for_found, candidates_for_lost, matches_overview, Candidate, FoundItemMatches,
    FoundMatchView, MatchIndex, MatchView,
};
pub use keyword::{extract_keywords, KeywordMatchIndex};

#[cfg(test)]
pub use index::MockMatchIndex;
