//! Content parser registry.
//!
//! Maps a file extension to a capability that turns a path into extracted text plus a
//! file-category tag. Format-specific extraction (PDF, DOCX, XLSX, ...) lives outside
//! this crate; only the plain-text reader and the universal metadata-only fallback are
//! implemented here.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::AppError;

pub struct ParseResult {
    pub body: String,
    pub file_type: String,
}

pub trait ContentParser: Send + Sync {
    /// Extensions (lowercase, no dot) this parser claims.
    fn extensions(&self) -> &[&str];

    /// Extract text from `path`. Recoverable failures (unreadable, not UTF-8 for a
    /// parser that requires it) are surfaced as `AppError::ParseFailure`; callers treat
    /// that as "skip this file", not a fatal error.
    fn parse(&self, path: &Path) -> Result<ParseResult, AppError>;
}

/// Reads the file as UTF-8 text verbatim. Used for every extension in
/// `config::SUPPORTED_EXTENSIONS` that isn't claimed by a more specific parser.
pub struct PlainTextParser;

impl ContentParser for PlainTextParser {
    fn extensions(&self) -> &[&str] {
        crate::config::SUPPORTED_EXTENSIONS
    }

    fn parse(&self, path: &Path) -> Result<ParseResult, AppError> {
        let file_type = file_type_of(path);
        match std::fs::read(path) {
            Ok(bytes) => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                Ok(ParseResult { body, file_type })
            }
            Err(e) => Err(AppError::ParseFailure(format!("{}: {e}", path.display()))),
        }
    }
}

/// Always succeeds with an empty body. The registry falls back to this for any
/// extension with no registered parser, so `include_all_files` mode can still insert a
/// metadata-only row.
pub struct MetadataOnlyParser;

impl ContentParser for MetadataOnlyParser {
    fn extensions(&self) -> &[&str] {
        &[]
    }

    fn parse(&self, path: &Path) -> Result<ParseResult, AppError> {
        Ok(ParseResult {
            body: String::new(),
            file_type: file_type_of(path),
        })
    }
}

pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

pub struct ParserRegistry {
    by_extension: HashMap<&'static str, Arc<dyn ContentParser>>,
    fallback: Arc<dyn ContentParser>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut by_extension: HashMap<&'static str, Arc<dyn ContentParser>> = HashMap::new();
        let text: Arc<dyn ContentParser> = Arc::new(PlainTextParser);
        for ext in crate::config::SUPPORTED_EXTENSIONS {
            by_extension.insert(ext, Arc::clone(&text));
        }
        Self {
            by_extension,
            fallback: Arc::new(MetadataOnlyParser),
        }
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, parser: Arc<dyn ContentParser>) {
        for ext in parser.extensions() {
            self.by_extension.insert(ext, Arc::clone(&parser));
        }
    }

    /// True if a non-universal parser is registered for this extension. Used by the
    /// pipeline to restrict `discover` in non-`include_all_files` mode.
    pub fn has_parser_for(&self, ext: &str) -> bool {
        self.by_extension.contains_key(ext)
    }

    pub fn registered_extensions(&self) -> Vec<&'static str> {
        self.by_extension.keys().copied().collect()
    }

    /// Resolve a parser by extension, falling back to the universal metadata-only one.
    pub fn parse(&self, path: &Path) -> Result<ParseResult, AppError> {
        let ext = file_type_of(path);
        let parser = self
            .by_extension
            .get(ext.as_str())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback));
        parser.parse(path)
    }
}
