//! Query Engine: exact/path/metadata/combined dispatch onto `Store`, plus the two-stage
//! fuzzy/hybrid search that is the algorithmic centerpiece of this crate.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::document::{MatchMethod, ResultRow};
use crate::error::AppResult;
use crate::similarity::best_similarity;
use crate::store::{MetadataFilter, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Exact,
    Fuzzy,
    Path,
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub search_type: SearchType,
    pub results: Vec<ResultRow>,
    pub total_results: usize,
    pub search_time: f64,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const DEFAULT_MIN_FUZZY_SCORE: f32 = 30.0;
const MAX_CANDIDATE_CAP: usize = 1000;
const HIGHLIGHT_WINDOW: usize = 300;

pub struct QueryEngine {
    store: Arc<Store>,
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF |
        0x3040..=0x30FF | 0xAC00..=0xD7A3)
}

/// Lowercase, replace non-word characters with spaces, split on whitespace. Keep
/// tokens of length >= 3; keep length-2 tokens that contain a CJK codepoint.
fn preprocess_query(query: &str) -> Vec<String> {
    static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]+").unwrap());
    let lowered = query.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|t| {
            let len = t.chars().count();
            len >= 3 || (len == 2 && t.chars().any(is_cjk))
        })
        .map(|s| s.to_string())
        .collect()
}

/// For each token `t`, build `(t OR t*)`; CJK tokens additionally get progressive
/// prefix wildcards `t[:i]*` for i in 2..len(t). Groups are ORed together rather than
/// ANDed — a minimum-should-match of one token group is enough to become a Stage 1
/// candidate, since requiring every token to survive a misspelling would exclude the
/// very documents Stage 2's similarity re-rank exists to find.
fn build_fts_query(tokens: &[String]) -> String {
    let groups: Vec<String> = tokens
        .iter()
        .map(|t| {
            let chars: Vec<char> = t.chars().collect();
            let mut alts = vec![t.clone(), format!("{t}*")];
            if chars.iter().any(|c| is_cjk(*c)) && chars.len() > 1 {
                for i in 2..chars.len() {
                    let prefix: String = chars[..i].iter().collect();
                    alts.push(format!("{prefix}*"));
                }
            }
            format!("({})", alts.join(" OR "))
        })
        .collect();
    groups.join(" OR ")
}

fn dedup_by_path(rows: Vec<ResultRow>) -> Vec<ResultRow> {
    let mut seen = std::collections::HashSet::new();
    rows.into_iter().filter(|r| seen.insert(r.path.clone())).collect()
}

/// Best excerpt (<= 300 chars) chosen by sliding a window and keeping the one with the
/// highest edit-ratio against the query. Query tokens are wrapped in a highlight marker.
fn highlight(body: &str, query: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    if chars.len() <= HIGHLIGHT_WINDOW {
        return wrap_tokens(body, query);
    }

    let step = 10usize;
    let mut best_start = 0;
    let mut best_score = -1.0f32;
    let mut start = 0;
    while start + HIGHLIGHT_WINDOW <= chars.len() {
        let window: String = chars[start..start + HIGHLIGHT_WINDOW].iter().collect();
        let (score, _) = best_similarity(query, &window);
        if score > best_score {
            best_score = score;
            best_start = start;
        }
        start += step;
    }

    let end = (best_start + HIGHLIGHT_WINDOW).min(chars.len());
    let excerpt: String = chars[best_start..end].iter().collect();
    let mut out = wrap_tokens(&excerpt, query);
    if best_start > 0 {
        out = format!("...{out}");
    }
    if end < chars.len() {
        out = format!("{out}...");
    }
    out
}

fn wrap_tokens(excerpt: &str, query: &str) -> String {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| regex::escape(&t.to_lowercase()))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return excerpt.to_string();
    }
    let pattern = format!("(?i)({})", tokens.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(excerpt, "<mark>$1</mark>").into_owned(),
        Err(_) => excerpt.to_string(),
    }
}

impl QueryEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn search(
        &self,
        query: &str,
        search_type: SearchType,
        limit: usize,
        min_fuzzy_score: f32,
        file_types: Option<&[String]>,
    ) -> AppResult<SearchResponse> {
        let start = std::time::Instant::now();

        if query.trim().is_empty() {
            return Ok(SearchResponse {
                success: true,
                query: query.to_string(),
                search_type,
                results: Vec::new(),
                total_results: 0,
                search_time: start.elapsed().as_secs_f64(),
                limit,
                error: None,
            });
        }

        let results = match search_type {
            SearchType::Exact => self
                .store
                .search_exact(query, limit, file_types)?
                .into_iter()
                .map(ResultRow::from)
                .collect(),
            SearchType::Path => self
                .store
                .search_path(query, limit, file_types)
                .into_iter()
                .map(ResultRow::from)
                .collect(),
            SearchType::Fuzzy => self.search_fuzzy(query, limit, min_fuzzy_score, file_types),
            SearchType::Hybrid => {
                let mut rows = Vec::new();
                rows.extend(self.store.search_exact(query, limit, file_types)?.into_iter().map(ResultRow::from));
                rows.extend(self.search_fuzzy(query, limit, min_fuzzy_score, file_types));
                rows.extend(self.store.search_path(query, limit, file_types).into_iter().map(ResultRow::from));
                let mut rows = dedup_by_path(rows);
                rows.truncate(limit);
                rows
            }
        };

        let total_results = results.len();
        Ok(SearchResponse {
            success: true,
            query: query.to_string(),
            search_type,
            results,
            total_results,
            search_time: start.elapsed().as_secs_f64(),
            limit,
            error: None,
        })
    }

    /// Stage 1 (candidate generation via the inverted index) + Stage 2 (similarity
    /// re-rank) + Stage 3 (highlight, strip body).
    fn search_fuzzy(&self, query: &str, limit: usize, min_fuzzy_score: f32, file_types: Option<&[String]>) -> Vec<ResultRow> {
        let tokens = preprocess_query(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        let fts_query = build_fts_query(&tokens);
        let candidate_limit = (limit.saturating_mul(5)).min(MAX_CANDIDATE_CAP);
        let mut candidates = self.store.search_inverted(&fts_query, candidate_limit, file_types);
        if candidates.is_empty() {
            // Neither the token nor its prefix survives when the indexed body is
            // misspelled relative to the query (or vice versa) — fall back to a bounded
            // scan of the whole corpus so Stage 2's similarity re-rank still gets a shot.
            candidates = self.store.scan_all(candidate_limit, file_types);
        }

        let lowered_query = query.to_lowercase();
        let mut scored: Vec<ResultRow> = Vec::new();
        for meta in candidates {
            let Some(body) = self.store.get_body(&meta.path) else { continue };
            let (score, method) = best_similarity(&lowered_query, &body.to_lowercase());
            if score < min_fuzzy_score {
                continue;
            }
            let mut row = ResultRow::from(meta);
            row.fuzzy_score = Some(score);
            row.fuzzy_method = Some(method.as_str());
            row.highlight = Some(highlight(&body, query));
            scored.push(row);
        }

        scored.sort_by(|a, b| b.fuzzy_score.partial_cmp(&a.fuzzy_score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Runs content and/or path sub-searches, dedupes by path (first occurrence wins),
    /// filters by `file_types` post-hoc, truncates to `limit`.
    pub fn search_advanced(
        &self,
        content: Option<&str>,
        path: Option<&str>,
        file_types: Option<&[String]>,
        fuzzy: bool,
        limit: usize,
    ) -> AppResult<Vec<ResultRow>> {
        let mut rows = Vec::new();
        if let Some(c) = content {
            if fuzzy {
                rows.extend(self.search_fuzzy(c, limit, DEFAULT_MIN_FUZZY_SCORE, None));
            } else {
                rows.extend(self.store.search_exact(c, limit, None)?.into_iter().map(ResultRow::from));
            }
        }
        if let Some(p) = path {
            rows.extend(self.store.search_path(p, limit, None).into_iter().map(ResultRow::from));
        }
        let mut rows = dedup_by_path(rows);
        if let Some(types) = file_types {
            if !types.is_empty() {
                rows.retain(|r| types.contains(&r.file_type));
            }
        }
        rows.truncate(limit);
        Ok(rows)
    }

    pub fn search_metadata(&self, filter: &MetadataFilter, limit: usize) -> Vec<ResultRow> {
        self.store.search_metadata(filter, limit).into_iter().map(ResultRow::from).collect()
    }

    pub fn search_combined(&self, filter: &MetadataFilter, content: Option<&str>, path: Option<&str>, limit: usize) -> AppResult<Vec<ResultRow>> {
        Ok(self.store.search_combined(filter, content, path, limit)?.into_iter().map(ResultRow::from).collect())
    }

    /// Vocabulary-based spelling suggestion: sample bodies, tokenize words longer than
    /// 3 chars, keep those whose edit-ratio against the query exceeds 60.
    pub fn suggest(&self, query: &str, max_suggestions: usize) -> Vec<String> {
        let sample: Vec<_> = self.store.list_all().into_iter().take(200).collect();
        let mut vocabulary = std::collections::HashSet::new();
        for meta in sample {
            if let Some(body) = self.store.get_body(&meta.path) {
                for word in body.split_whitespace() {
                    let w = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
                    if w.chars().count() > 3 {
                        vocabulary.insert(w);
                    }
                }
            }
        }

        let lowered = query.to_lowercase();
        let mut scored: Vec<(String, f32)> = vocabulary
            .into_iter()
            .filter_map(|word| {
                let (score, _) = best_similarity(&lowered, &word);
                (score > 60.0).then_some((word, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(max_suggestions).map(|(w, _)| w).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_drops_short_latin_tokens() {
        let tokens = preprocess_query("a of the python programming");
        assert_eq!(tokens, vec!["the", "python", "programming"]);
    }

    #[test]
    fn build_fts_query_joins_groups_with_or() {
        let query = build_fts_query(&["python".to_string(), "code".to_string()]);
        assert_eq!(query, "(python OR python*) OR (code OR code*)");
    }

    #[test]
    fn highlight_wraps_matching_tokens() {
        let out = highlight("the quick brown fox", "quick");
        assert!(out.contains("<mark>quick</mark>"));
    }
}
