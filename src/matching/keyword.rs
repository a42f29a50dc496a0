// Keyword similarity oracle
//
// Score = keyword overlap (up to 60) + same category (20) + same subcategory (10)
//       + date proximity (up to 10), capped at 100.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::index::{Candidate, MatchIndex};
use crate::items::{FoundItem, LostItem};

static TOKEN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("token pattern is valid"));

const STOP_WORDS: &[&str] = &[
    "and", "are", "but", "for", "from", "had", "has", "have", "her", "his", "its", "lost",
    "found", "near", "not", "one", "our", "the", "that", "them", "then", "there", "this",
    "was", "were", "with", "you", "your", "item", "left", "some", "very",
];

/// Lowercased, stop-word-free keywords longer than two characters
pub fn extract_keywords(texts: &[Option<&str>]) -> BTreeSet<String> {
    texts
        .iter()
        .flatten()
        .flat_map(|text| {
            let lowered = text.to_lowercase();
            TOKEN_SPLIT
                .split(&lowered)
                .filter(|token| token.len() > 2 && !STOP_WORDS.contains(token))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b))
}

/// Equal when both present; two missing values are compatible
fn compatible(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        _ => same(a, b),
    }
}

fn date_points(days: i64) -> u32 {
    match days.abs() {
        0 => 10,
        1..=3 => 7,
        4..=7 => 5,
        8..=14 => 3,
        _ => 0,
    }
}

/// Default scoring oracle. Candidates must share category and subcategory and
/// at least one keyword.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatchIndex;

impl KeywordMatchIndex {
    pub fn new() -> Self {
        Self
    }

    fn score(&self, found: &FoundItem, found_keywords: &BTreeSet<String>, lost: &LostItem) -> Option<Candidate> {
        let found_category = found.category.as_deref();
        let found_subcategory = found.subcategory.as_deref();
        if !compatible(found_category, lost.category.as_deref())
            || !compatible(found_subcategory, lost.subcategory.as_deref())
        {
            return None;
        }

        let lost_keywords = extract_keywords(&[Some(&lost.title), lost.description.as_deref()]);
        let shared: Vec<&str> = found_keywords
            .intersection(&lost_keywords)
            .map(String::as_str)
            .collect();
        if shared.is_empty() {
            return None;
        }

        let denominator = found_keywords.len().max(lost_keywords.len()) as f64;
        let mut score = (shared.len() as f64 / denominator * 60.0) as u32;
        let mut reasons = vec![format!("{} matching keywords: {}", shared.len(), shared.join(", "))];

        if same(found_category, lost.category.as_deref()) {
            score += 20;
            reasons.push(format!("Same category: {}", found_category.unwrap_or_default()));
        }
        if same(found_subcategory, lost.subcategory.as_deref()) {
            score += 10;
            reasons.push(format!("Same subcategory: {}", found_subcategory.unwrap_or_default()));
        }
        if let (Some(found_on), Some(lost_on)) = (found.date_found, lost.date_lost) {
            score += date_points((found_on - lost_on).num_days());
        }

        Some(Candidate {
            lost_item_id: lost.id,
            confidence_score: score.min(100),
            reason: reasons.join(" | "),
        })
    }
}

impl MatchIndex for KeywordMatchIndex {
    fn find_candidates(&self, found: &FoundItem, lost_items: &[LostItem]) -> Vec<Candidate> {
        let found_keywords = extract_keywords(&[Some(&found.title), found.description.as_deref()]);
        if found_keywords.is_empty() {
            return Vec::new();
        }
        lost_items
            .iter()
            .filter_map(|lost| self.score(found, &found_keywords, lost))
            .collect()
    }
}
