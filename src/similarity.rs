//! Four similarity measures over [0, 100], mirroring rapidfuzz's `ratio`/`partial_ratio`/
//! `token_sort_ratio`/`token_set_ratio`. Edit-ratio is backed by `strsim`'s normalized
//! Levenshtein distance; the other three are built on top of it.
//!
//! Kept pluggable behind `best_similarity`, which returns the winning measure alongside
//! its score so callers (the fuzzy query engine) can report `fuzzy_method`.

use std::collections::BTreeSet;

use crate::document::MatchMethod;

fn ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0) as f32
}

/// Best edit-ratio over windows of the longer string against the shorter one.
fn partial_ratio(a: &str, b: &str) -> f32 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if shorter.is_empty() {
        return if longer.is_empty() { 100.0 } else { 0.0 };
    }

    let longer_chars: Vec<char> = longer.chars().collect();
    let short_len = shorter.chars().count();
    if longer_chars.len() <= short_len {
        return ratio(shorter, longer);
    }

    let mut best = 0.0f32;
    for start in 0..=(longer_chars.len() - short_len) {
        let window: String = longer_chars[start..start + short_len].iter().collect();
        let score = ratio(shorter, &window);
        if score > best {
            best = score;
        }
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn tokenize(s: &str) -> Vec<String> {
    s.split_whitespace().map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect()
}

fn token_sort_ratio(a: &str, b: &str) -> f32 {
    let mut ta = tokenize(a);
    let mut tb = tokenize(b);
    ta.sort();
    tb.sort();
    ratio(&ta.join(" "), &tb.join(" "))
}

fn token_set_ratio(a: &str, b: &str) -> f32 {
    let ta: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tb: BTreeSet<String> = tokenize(b).into_iter().collect();

    let intersection: Vec<&String> = ta.intersection(&tb).collect();
    let diff_a: Vec<&String> = ta.difference(&tb).collect();
    let diff_b: Vec<&String> = tb.difference(&ta).collect();

    let sorted_intersection = join_sorted(&intersection);
    let combined_a = join_sorted_with(&intersection, &diff_a);
    let combined_b = join_sorted_with(&intersection, &diff_b);

    let r1 = ratio(&sorted_intersection, &combined_a);
    let r2 = ratio(&sorted_intersection, &combined_b);
    let r3 = ratio(&combined_a, &combined_b);

    r1.max(r2).max(r3)
}

fn join_sorted(tokens: &[&String]) -> String {
    let mut v: Vec<&str> = tokens.iter().map(|s| s.as_str()).collect();
    v.sort();
    v.join(" ")
}

fn join_sorted_with(base: &[&String], extra: &[&String]) -> String {
    let mut v: Vec<&str> = base.iter().chain(extra.iter()).map(|s| s.as_str()).collect();
    v.sort();
    v.join(" ")
}

/// Maximum of the four measures, plus which one produced it.
pub fn best_similarity(query: &str, body: &str) -> (f32, MatchMethod) {
    let candidates = [
        (ratio(query, body), MatchMethod::Ratio),
        (partial_ratio(query, body), MatchMethod::PartialRatio),
        (token_sort_ratio(query, body), MatchMethod::TokenSortRatio),
        (token_set_ratio(query, body), MatchMethod::TokenSetRatio),
    ];
    candidates
        .into_iter()
        .fold((0.0, MatchMethod::Ratio), |best, cur| if cur.0 > best.0 { cur } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        let (score, _) = best_similarity("hello world", "hello world");
        assert!((score - 100.0).abs() < 0.01);
    }

    #[test]
    fn substring_scores_at_least_60() {
        let (score, _) = best_similarity("quick", "the quick brown fox jumps over the lazy dog");
        assert!(score >= 60.0, "expected >= 60, got {score}");
    }

    #[test]
    fn token_order_does_not_matter_for_sort_ratio() {
        let score = token_sort_ratio("brown fox quick", "quick fox brown");
        assert!((score - 100.0).abs() < 0.01);
    }

    #[test]
    fn completely_disjoint_strings_score_low() {
        let (score, _) = best_similarity("aaaaaaaaaa", "zzzzzzzzzz");
        assert!(score < 40.0);
    }
}
