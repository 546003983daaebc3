//! Merge per-source result sets into one ranked list.

use std::collections::HashSet;

use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use serde::Serialize;

use crate::models::SearchSuggestion;

/// A suggestion placed in the merged list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSuggestion {
    pub source_id: String,
    /// Fuzzy score of the title against the query, 0 when it does not match
    pub score: u32,
    pub suggestion: SearchSuggestion,
}

/// Combine result sets given in source order.
///
/// Items are fuzzy-scored on their title and stable-sorted by score, so ties
/// keep source order and then each provider's own order. Items that do not
/// match the query at all are kept with score 0 since providers may match on
/// fields the palette never sees. Only the first `(entity_type, id)` pair
/// survives.
pub fn merge_results(
    query: &str,
    sets: &[(&str, &[SearchSuggestion])],
    limit: usize,
) -> Vec<RankedSuggestion> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(query.trim(), CaseMatching::Ignore, Normalization::Smart);
    let mut buf = Vec::new();

    let mut ranked: Vec<RankedSuggestion> = sets
        .iter()
        .flat_map(|(source_id, results)| results.iter().map(move |s| (*source_id, s)))
        .map(|(source_id, suggestion)| {
            let score = pattern
                .score(Utf32Str::new(&suggestion.title, &mut buf), &mut matcher)
                .unwrap_or(0);
            RankedSuggestion {
                source_id: source_id.to_string(),
                score,
                suggestion: suggestion.clone(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let mut seen = HashSet::new();
    ranked.retain(|item| {
        seen.insert((item.suggestion.entity_type.clone(), item.suggestion.id.clone()))
    });
    ranked.truncate(limit);
    ranked
}
