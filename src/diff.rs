use std::collections::HashSet;

use crate::models::MatchResult;

/// Matches in `current` that are not in `baseline`, ordered by match string.
pub fn new_matches(
    current: &HashSet<MatchResult>,
    baseline: &HashSet<MatchResult>,
) -> Vec<MatchResult> {
    let mut fresh: Vec<MatchResult> = current.difference(baseline).cloned().collect();
    fresh.sort_by_cached_key(|m| m.to_string());
    fresh
}
