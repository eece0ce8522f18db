//! Fuzzy scoring of a normalized query against normalized job titles.

use std::cmp::Ordering;
use std::collections::HashSet;

use strsim::jaro_winkler;

use crate::models::JobRecord;

/// Score band for an exact normalized match.
const EXACT: f64 = 1.0;
/// Score band for a normalized substring match in either direction.
const SUBSTRING: f64 = 0.95;
/// Blend weights for the non-substring path.
const OVERLAP_WEIGHT: f64 = 0.6;
const SIMILARITY_WEIGHT: f64 = 0.4;

/// Scores `query` against a job title; both sides must already be in
/// canonical form. Returns a value in [0, 1].
///
/// Token overlap carries most of the weight so word order barely matters
/// ("engineer software" still lands close to "software engineer");
/// Jaro-Winkler picks up misspellings the token sets miss.
pub fn score(query: &str, title_norm: &str) -> f64 {
    if query.is_empty() {
        return EXACT;
    }
    if query == title_norm {
        return EXACT;
    }
    if !title_norm.is_empty() && (title_norm.contains(query) || query.contains(title_norm)) {
        return SUBSTRING;
    }

    let query_tokens: HashSet<&str> = query.split_whitespace().collect();
    let title_tokens: HashSet<&str> = title_norm.split_whitespace().collect();
    if query_tokens.is_empty() {
        return EXACT;
    }
    let shared = query_tokens.intersection(&title_tokens).count();
    let overlap = shared as f64 / query_tokens.len() as f64;

    let similarity = jaro_winkler(query, title_norm);

    (OVERLAP_WEIGHT * overlap + SIMILARITY_WEIGHT * similarity).clamp(0.0, 1.0)
}

/// Ordering for ranked results: score descending, then more recent posted
/// date, then identifier. Total and deterministic, so pagination is stable.
pub fn rank_cmp(a: &(f64, &JobRecord), b: &(f64, &JobRecord)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.1.posted.cmp(&a.1.posted))
        .then_with(|| a.1.id.cmp(&b.1.id))
}
