use serde::{Deserialize, Serialize};

/// One row of the metadata table. `id` is assigned by the Store on first insert and
/// stays stable across `add` (replace) and `rename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: u64,
    pub path: String,
    pub content_hash: String,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
    pub indexed_at: i64,
    pub file_type: String,
}

/// The measure that produced a fuzzy candidate's winning score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Ratio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Ratio => "ratio",
            MatchMethod::PartialRatio => "partial_ratio",
            MatchMethod::TokenSortRatio => "token_sort_ratio",
            MatchMethod::TokenSetRatio => "token_set_ratio",
        }
    }
}

/// A single search result row. The body is never included — callers that need it call
/// `get_body` separately (fuzzy search attaches `highlight` instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub path: String,
    pub file_type: String,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
    pub indexed_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl From<DocumentMeta> for ResultRow {
    fn from(m: DocumentMeta) -> Self {
        ResultRow {
            path: m.path,
            file_type: m.file_type,
            size: m.size,
            created_at: m.created_at,
            modified_at: m.modified_at,
            indexed_at: m.indexed_at,
            fuzzy_score: None,
            fuzzy_method: None,
            highlight: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub document_count: u64,
    pub total_body_size: u64,
    pub store_size: u64,
    pub file_type_histogram: std::collections::BTreeMap<String, u64>,
}
