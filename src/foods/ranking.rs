//! Deduplication, relevance ranking and barcode candidate selection.
//!
//! All functions here are pure; given the same input they produce the same
//! output in the same order.

use std::cmp::Reverse;
use std::collections::HashSet;

use super::dto::FoodRecord;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Identity used for deduplication: normalized name and brand.
pub fn dedupe_key(record: &FoodRecord) -> (String, String) {
    (
        normalize(&record.name),
        normalize(record.brand.as_deref().unwrap_or_default()),
    )
}

/// Keeps the first record seen for each `dedupe_key`.
pub fn dedupe(records: Vec<FoodRecord>) -> Vec<FoodRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(dedupe_key(r)))
        .collect()
}

/// Text and metadata relevance of `record` for an already lower-cased,
/// trimmed `query`.
pub fn relevance_score(record: &FoodRecord, query: &str) -> i64 {
    let name = normalize(&record.name);
    let mut score = 0;

    if name.contains(query) {
        score += 10;
        if name == query {
            score += 20;
        }
    }
    if record
        .brand
        .as_deref()
        .is_some_and(|b| b.to_lowercase().contains(query))
    {
        score += 5;
    }
    if record.has_complete_nutrition() {
        score += 3;
    }
    if record.image_url.is_some() {
        score += 2;
    }

    let name_words = name.split_whitespace().count();
    let query_words = query.split_whitespace().count();
    score - 5 * name_words.saturating_sub(query_words) as i64
}

/// Sorts by descending relevance; equal scores keep their input order.
pub fn rank(records: Vec<FoodRecord>, query: &str) -> Vec<FoodRecord> {
    let query = normalize(query);
    let mut scored: Vec<(i64, FoodRecord)> = records
        .into_iter()
        .map(|r| (relevance_score(&r, &query), r))
        .collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().map(|(_, r)| r).collect()
}

/// Completeness of a barcode candidate, 0..=12.
pub fn quality_score(record: &FoodRecord) -> u8 {
    let mut score = 0;
    if record.protein > 0.0 {
        score += 2;
    }
    if record.carbs > 0.0 {
        score += 2;
    }
    if record.fat > 0.0 {
        score += 2;
    }
    if record.image_url.is_some() {
        score += 3;
    }
    if record.brand.is_some() {
        score += 2;
    }
    if record.barcode.is_some() {
        score += 1;
    }
    score
}

/// Highest `quality_score` wins; the first candidate wins ties.
pub fn pick_best(candidates: impl IntoIterator<Item = FoodRecord>) -> Option<FoodRecord> {
    let mut best: Option<(u8, FoodRecord)> = None;
    for candidate in candidates {
        let score = quality_score(&candidate);
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, r)| r)
}
