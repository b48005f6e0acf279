//! The durable index: a metadata table (one row per document, kept as an in-memory
//! DashMap mirrored to a JSON sidecar) and a full-text table (a Tantivy index). All
//! writes funnel through `writer_lock` — Tantivy only allows one writer at a time, and
//! the sidecar and the index must move together or not at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::warn;

use crate::document::{DocumentMeta, StoreStats};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub path: Field,
    pub file_type: Field,
    pub content_hash: Field,
    pub size: Field,
    pub created_at: Field,
    pub modified_at: Field,
    pub indexed_at: Field,
    pub body: Field,
    schema: Schema,
}

impl StoreSchema {
    fn build() -> Self {
        let mut builder = Schema::builder();
        let path = builder.add_text_field("path", STRING | STORED);
        let file_type = builder.add_text_field("file_type", STRING | STORED);
        let content_hash = builder.add_text_field("content_hash", STRING | STORED);
        let size = builder.add_u64_field("size", INDEXED | STORED);
        let created_at = builder.add_i64_field("created_at", INDEXED | STORED);
        let modified_at = builder.add_i64_field("modified_at", INDEXED | STORED);
        let indexed_at = builder.add_i64_field("indexed_at", INDEXED | STORED);
        // "body" doubles as `docs_fts` — the full-text table. A STORED empty body means
        // metadata-only indexing; it never matches a token query but is still readable.
        let body = builder.add_text_field("body", TEXT | STORED);

        let schema = builder.build();
        Self { path, file_type, content_hash, size, created_at, modified_at, indexed_at, body, schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Durable document store. One `Store` owns one on-disk index directory. Mutations go
/// through `writer_lock`; reads go through `reader`, which is reloaded after every
/// commit so query-time handles see the new generation.
pub struct Store {
    index: Index,
    reader: IndexReader,
    schema: StoreSchema,
    dir: PathBuf,
    writer_lock: tokio::sync::Mutex<()>,
    /// path -> metadata, mirrored to `meta.sidecar.json`. Gives O(1) `is_indexed` and
    /// `list_all` without walking the Tantivy index.
    meta: DashMap<String, DocumentMeta>,
    next_id: AtomicU64,
}

fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join("meta_sidecar.json")
}

fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

fn hash_file(path: &Path) -> AppResult<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| AppError::ResourceUnavailable(format!("{}: {e}", path.display())))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];
    use std::io::Read;
    loop {
        let n = file.read(&mut buf).map_err(|e| AppError::StoreFailure(e.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Loads the metadata sidecar, backfilling rows written by a schema that predates
/// `modified_at`: per spec, such a row gets `modified_at` from the path's filesystem
/// mtime, falling back to its own `indexed_at` when the stat fails. A row that still
/// doesn't deserialize after backfill is dropped and logged, not the whole sidecar.
fn load_sidecar(path: &Path) -> Vec<DocumentMeta> {
    let Ok(json) = std::fs::read_to_string(path) else { return Vec::new() };
    let raw_rows: Vec<serde_json::Value> = match serde_json::from_str(&json) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("sidecar at {} is not valid JSON ({e}), starting empty", path.display());
            return Vec::new();
        }
    };

    let mut rows = Vec::with_capacity(raw_rows.len());
    for mut value in raw_rows {
        if value.get("modified_at").is_none() {
            let doc_path = value.get("path").and_then(|v| v.as_str()).unwrap_or_default();
            let indexed_at = value.get("indexed_at").and_then(|v| v.as_i64()).unwrap_or_else(now);
            let modified_at = std::fs::metadata(doc_path)
                .ok()
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(indexed_at);
            if let Some(obj) = value.as_object_mut() {
                obj.insert("modified_at".to_string(), serde_json::json!(modified_at));
            }
        }
        match serde_json::from_value::<DocumentMeta>(value) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("dropping unreadable sidecar row in {}: {e}", path.display()),
        }
    }
    rows
}

fn stat_times(path: &Path) -> (i64, i64) {
    let meta = std::fs::metadata(path).ok();
    let modified_at = meta
        .as_ref()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or_else(now);
    let created_at = meta
        .as_ref()
        .and_then(|m| m.created().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(modified_at);
    (created_at, modified_at)
}

impl Store {
    /// Create or open the index at `dir`, loading the metadata sidecar if present.
    pub fn open(dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(dir)?;
        let schema = StoreSchema::build();

        let index = if dir.join("meta.json").exists() {
            Index::open_in_dir(dir).map_err(|e| AppError::StoreFailure(format!("open index: {e}")))?
        } else {
            Index::create_in_dir(dir, schema.schema().clone())
                .map_err(|e| AppError::StoreFailure(format!("create index: {e}")))?
        };
        let reader = index.reader().map_err(|e| AppError::StoreFailure(format!("reader: {e}")))?;

        let meta = DashMap::new();
        let mut max_id = 0u64;
        for row in load_sidecar(&sidecar_path(dir)) {
            max_id = max_id.max(row.id);
            meta.insert(row.path.clone(), row);
        }

        Ok(Self {
            index,
            reader,
            schema,
            dir: dir.to_path_buf(),
            writer_lock: tokio::sync::Mutex::new(()),
            meta,
            next_id: AtomicU64::new(max_id + 1),
        })
    }

    fn persist_sidecar(&self) -> AppResult<()> {
        let rows: Vec<DocumentMeta> = self.meta.iter().map(|e| e.value().clone()).collect();
        let json = serde_json::to_string(&rows)?;
        atomic_write(&sidecar_path(&self.dir), &json)?;
        Ok(())
    }

    /// Change-detection primitive: true iff a row exists for `path` whose stored hash
    /// equals a freshly computed one.
    pub fn is_indexed(&self, path: &str) -> bool {
        let Some(entry) = self.meta.get(path) else { return false };
        match hash_file(Path::new(path)) {
            Ok(hash) => hash == entry.content_hash,
            Err(_) => false,
        }
    }

    fn make_document(&self, meta: &DocumentMeta, body: &str) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.schema.path, &meta.path);
        doc.add_text(self.schema.file_type, &meta.file_type);
        doc.add_text(self.schema.content_hash, &meta.content_hash);
        doc.add_u64(self.schema.size, meta.size);
        doc.add_i64(self.schema.created_at, meta.created_at);
        doc.add_i64(self.schema.modified_at, meta.modified_at);
        doc.add_i64(self.schema.indexed_at, meta.indexed_at);
        doc.add_text(self.schema.body, body);
        doc
    }

    /// Upsert by path. Reuses the existing id on replace. Hashing the file is a hard
    /// requirement — failure to hash is a `StoreFailure` and nothing is written.
    pub async fn add(&self, path: &str, body: &str, file_type: &str, created_at: Option<i64>) -> AppResult<bool> {
        let content_hash = hash_file(Path::new(path))?;
        if content_hash.is_empty() {
            return Err(AppError::StoreFailure(format!("empty hash for {path}")));
        }

        let (stat_created, modified_at) = stat_times(Path::new(path));
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let id = self
            .meta
            .get(path)
            .map(|e| e.id)
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));

        let meta = DocumentMeta {
            id,
            path: path.to_string(),
            content_hash,
            size,
            created_at: created_at.unwrap_or(stat_created),
            modified_at,
            indexed_at: now(),
            file_type: file_type.to_string(),
        };

        let _guard = self.writer_lock.lock().await;
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .map_err(|e| AppError::StoreFailure(format!("writer: {e}")))?;

        writer.delete_term(Term::from_field_text(self.schema.path, path));
        // A document with empty body still gets an entry (metadata-only indexing); the
        // field is TEXT so an empty value simply never matches a token query.
        let doc = self.make_document(&meta, body);
        writer
            .add_document(doc)
            .map_err(|e| AppError::StoreFailure(format!("add_document: {e}")))?;
        writer.commit().map_err(|e| AppError::StoreFailure(format!("commit: {e}")))?;
        self.reader.reload().map_err(|e| AppError::StoreFailure(format!("reload: {e}")))?;

        self.meta.insert(path.to_string(), meta);
        self.persist_sidecar()?;
        Ok(true)
    }

    /// Same as `add` applied to every record in one transaction. Partial failures are
    /// recorded and skipped; rows that hashed and committed successfully are returned.
    pub async fn add_batch(&self, records: &[(String, String, String, Option<i64>)]) -> AppResult<usize> {
        let mut prepared = Vec::with_capacity(records.len());
        for (path, body, file_type, created_at) in records {
            match hash_file(Path::new(path)) {
                Ok(content_hash) if !content_hash.is_empty() => {
                    let (stat_created, modified_at) = stat_times(Path::new(path));
                    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                    let id = self
                        .meta
                        .get(path.as_str())
                        .map(|e| e.id)
                        .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));
                    let meta = DocumentMeta {
                        id,
                        path: path.clone(),
                        content_hash,
                        size,
                        created_at: created_at.unwrap_or(stat_created),
                        modified_at,
                        indexed_at: now(),
                        file_type: file_type.clone(),
                    };
                    prepared.push((meta, body.clone()));
                }
                _ => warn!("skipping batch row for {path}: hash failed"),
            }
        }

        if prepared.is_empty() {
            return Ok(0);
        }

        let _guard = self.writer_lock.lock().await;
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .map_err(|e| AppError::StoreFailure(format!("writer: {e}")))?;

        for (meta, body) in &prepared {
            writer.delete_term(Term::from_field_text(self.schema.path, &meta.path));
            let doc = self.make_document(meta, body);
            if let Err(e) = writer.add_document(doc) {
                warn!("add_document failed for {}: {e}", meta.path);
            }
        }
        writer.commit().map_err(|e| AppError::StoreFailure(format!("commit: {e}")))?;
        self.reader.reload().map_err(|e| AppError::StoreFailure(format!("reload: {e}")))?;

        let count = prepared.len();
        for (meta, _) in prepared {
            self.meta.insert(meta.path.clone(), meta);
        }
        self.persist_sidecar()?;
        Ok(count)
    }

    pub async fn remove(&self, path: &str) -> AppResult<bool> {
        if self.meta.remove(path).is_none() {
            return Ok(false);
        }
        let _guard = self.writer_lock.lock().await;
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .map_err(|e| AppError::StoreFailure(format!("writer: {e}")))?;
        writer.delete_term(Term::from_field_text(self.schema.path, path));
        writer.commit().map_err(|e| AppError::StoreFailure(format!("commit: {e}")))?;
        self.reader.reload().map_err(|e| AppError::StoreFailure(format!("reload: {e}")))?;
        self.persist_sidecar()?;
        Ok(true)
    }

    pub async fn rename(&self, old: &str, new: &str) -> AppResult<bool> {
        let Some((_, mut meta)) = self.meta.remove(old) else { return Ok(false) };
        let body = self.get_body(old).unwrap_or_default();
        meta.path = new.to_string();

        let _guard = self.writer_lock.lock().await;
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .map_err(|e| AppError::StoreFailure(format!("writer: {e}")))?;
        writer.delete_term(Term::from_field_text(self.schema.path, old));
        writer.delete_term(Term::from_field_text(self.schema.path, new));
        let doc = self.make_document(&meta, &body);
        writer
            .add_document(doc)
            .map_err(|e| AppError::StoreFailure(format!("add_document: {e}")))?;
        writer.commit().map_err(|e| AppError::StoreFailure(format!("commit: {e}")))?;
        self.reader.reload().map_err(|e| AppError::StoreFailure(format!("reload: {e}")))?;

        self.meta.insert(new.to_string(), meta);
        self.persist_sidecar()?;
        Ok(true)
    }

    fn lookup_body(&self, path: &str) -> AppResult<Option<String>> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.schema.path, path);
        let query = tantivy::query::TermQuery::new(term, IndexRecordOption::Basic);
        let results = searcher
            .search(&query, &tantivy::collector::TopDocs::with_limit(1))
            .map_err(|e| AppError::QueryFailure(e.to_string()))?;
        let Some((_, addr)) = results.into_iter().next() else { return Ok(None) };
        let doc: TantivyDocument = searcher.doc(addr).map_err(|e| AppError::QueryFailure(e.to_string()))?;
        let body = doc
            .get_first(self.schema.body)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Ok(Some(body))
    }

    /// `None` when the document doesn't exist or has an empty (metadata-only) body.
    pub fn get_body(&self, path: &str) -> Option<String> {
        if !self.meta.contains_key(path) {
            return None;
        }
        match self.lookup_body(path) {
            Ok(Some(body)) if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    pub fn list_all(&self) -> Vec<DocumentMeta> {
        let mut rows: Vec<DocumentMeta> = self.meta.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        rows
    }

    pub fn stats(&self) -> StoreStats {
        let mut total_body_size = 0u64;
        let mut histogram: HashMap<String, u64> = HashMap::new();
        for entry in self.meta.iter() {
            total_body_size += entry.size;
            *histogram.entry(entry.file_type.clone()).or_insert(0) += 1;
        }
        let store_size = fs_extra_dir_size(&self.dir);
        StoreStats {
            document_count: self.meta.len() as u64,
            total_body_size,
            store_size,
            file_type_histogram: histogram.into_iter().collect(),
        }
    }

    fn filter_meta<'a>(&'a self, file_types: Option<&'a [String]>) -> impl Iterator<Item = DocumentMeta> + 'a {
        self.meta.iter().filter_map(move |e| {
            let row = e.value().clone();
            match file_types {
                Some(types) if !types.is_empty() => types.contains(&row.file_type).then_some(row),
                _ => Some(row),
            }
        })
    }

    /// AND of substring predicates over the body (case-insensitive).
    pub fn search_exact(&self, query: &str, limit: usize, file_types: Option<&[String]>) -> AppResult<Vec<DocumentMeta>> {
        let tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for meta in self.filter_meta(file_types) {
            let body = match self.lookup_body(&meta.path)? {
                Some(b) => b.to_lowercase(),
                None => continue,
            };
            if tokens.iter().all(|t| body.contains(t.as_str())) {
                out.push(meta);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Candidate generation for fuzzy search: a tantivy query string built by the query
    /// engine (token groups joined by AND/OR with wildcards), run with relevance
    /// ordering. Falls back to `search_exact` on any parse/execution failure.
    pub fn search_inverted(&self, query_str: &str, limit: usize, file_types: Option<&[String]>) -> Vec<DocumentMeta> {
        let result = (|| -> AppResult<Vec<DocumentMeta>> {
            let parser = QueryParser::for_index(&self.index, vec![self.schema.body]);
            let query = parser
                .parse_query(query_str)
                .map_err(|e| AppError::QueryFailure(e.to_string()))?;
            let searcher = self.reader.searcher();
            let hits = searcher
                .search(&query, &tantivy::collector::TopDocs::with_limit(limit.max(1)))
                .map_err(|e| AppError::QueryFailure(e.to_string()))?;

            let mut out = Vec::new();
            for (_, addr) in hits {
                let doc: TantivyDocument = searcher.doc(addr).map_err(|e| AppError::QueryFailure(e.to_string()))?;
                let path = doc.get_first(self.schema.path).and_then(|v| v.as_str()).unwrap_or_default();
                if let Some(meta) = self.meta.get(path) {
                    let row = meta.value().clone();
                    match file_types {
                        Some(types) if !types.is_empty() && !types.contains(&row.file_type) => continue,
                        _ => out.push(row),
                    }
                }
            }
            Ok(out)
        })();

        match result {
            Ok(rows) if !rows.is_empty() => rows,
            _ => self.search_exact(query_str, limit, file_types).unwrap_or_default(),
        }
    }

    /// AND of substring predicates over the path, ordered by path.
    pub fn search_path(&self, query: &str, limit: usize, file_types: Option<&[String]>) -> Vec<DocumentMeta> {
        let tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut rows: Vec<DocumentMeta> = self
            .filter_meta(file_types)
            .filter(|m| {
                let p = m.path.to_lowercase();
                tokens.iter().all(|t| p.contains(t.as_str()))
            })
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows.truncate(limit);
        rows
    }

    /// Conjunction of range predicates over the metadata table, ordered by `created_at`
    /// descending.
    pub fn search_metadata(&self, filter: &MetadataFilter, limit: usize) -> Vec<DocumentMeta> {
        let mut rows: Vec<DocumentMeta> = self
            .meta
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        rows
    }

    /// Same predicate conjunction as `search_metadata`, joining against the full-text
    /// table only when a content predicate is supplied.
    pub fn search_combined(&self, filter: &MetadataFilter, content: Option<&str>, path: Option<&str>, limit: usize) -> AppResult<Vec<DocumentMeta>> {
        let mut rows: Vec<DocumentMeta> = self
            .meta
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();

        if let Some(q) = path {
            let tokens: Vec<String> = q.split_whitespace().map(|t| t.to_lowercase()).collect();
            rows.retain(|m| {
                let p = m.path.to_lowercase();
                tokens.iter().all(|t| p.contains(t.as_str()))
            });
        }

        if let Some(q) = content {
            let tokens: Vec<String> = q.split_whitespace().map(|t| t.to_lowercase()).collect();
            let mut kept = Vec::new();
            for m in rows {
                if let Some(body) = self.lookup_body(&m.path)? {
                    let body = body.to_lowercase();
                    if tokens.iter().all(|t| body.contains(t.as_str())) {
                        kept.push(m);
                    }
                }
            }
            rows = kept;
        }

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    pub fn path_indexed(&self, path: &str) -> bool {
        self.meta.contains_key(path)
    }

    /// Bounded scan of the whole metadata table, unordered. Last-resort candidate source
    /// for fuzzy search when the inverted-index query surfaces nothing.
    pub fn scan_all(&self, limit: usize, file_types: Option<&[String]>) -> Vec<DocumentMeta> {
        self.filter_meta(file_types).take(limit).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub min_created_at: Option<i64>,
    pub max_created_at: Option<i64>,
    pub file_types: Option<Vec<String>>,
}

impl MetadataFilter {
    fn matches(&self, m: &DocumentMeta) -> bool {
        if let Some(min) = self.min_size {
            if m.size < min {
                return false;
            }
        }
        if let Some(max) = self.max_size {
            if m.size > max {
                return false;
            }
        }
        if let Some(min) = self.min_created_at {
            if m.created_at < min {
                return false;
            }
        }
        if let Some(max) = self.max_created_at {
            if m.created_at > max {
                return false;
            }
        }
        if let Some(types) = &self.file_types {
            if !types.is_empty() && !types.contains(&m.file_type) {
                return false;
            }
        }
        true
    }
}

fn fs_extra_dir_size(dir: &Path) -> u64 {
    let mut total = 0u64;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                if meta.is_file() {
                    total += meta.len();
                } else if meta.is_dir() {
                    total += fs_extra_dir_size(&entry.path());
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn add_then_get_body_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "the quick brown fox").unwrap();
        let (_dir, store) = open_store().await;

        store.add(file.to_str().unwrap(), "the quick brown fox", "txt", None).await.unwrap();
        assert_eq!(store.get_body(file.to_str().unwrap()).unwrap(), "the quick brown fox");
        assert_eq!(store.stats().document_count, 1);
    }

    #[tokio::test]
    async fn empty_body_has_no_get_body_but_is_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("empty.txt");
        fs::write(&file, "").unwrap();
        let (_dir, store) = open_store().await;

        store.add(file.to_str().unwrap(), "", "txt", None).await.unwrap();
        assert!(store.get_body(file.to_str().unwrap()).is_none());
        assert_eq!(store.list_all().len(), 1);
    }

    #[tokio::test]
    async fn is_indexed_false_after_file_mutation() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "version one").unwrap();
        let (_dir, store) = open_store().await;
        let path = file.to_str().unwrap();

        store.add(path, "version one", "txt", None).await.unwrap();
        assert!(store.is_indexed(path));

        fs::write(&file, "version two, totally different bytes").unwrap();
        assert!(!store.is_indexed(path));
    }

    #[tokio::test]
    async fn search_exact_requires_all_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, "the quick brown fox").unwrap();
        fs::write(&b, "quick silver").unwrap();
        let (_dir, store) = open_store().await;

        store.add(a.to_str().unwrap(), "the quick brown fox", "txt", None).await.unwrap();
        store.add(b.to_str().unwrap(), "quick silver", "txt", None).await.unwrap();

        let both = store.search_exact("quick", 10, None).unwrap();
        assert_eq!(both.len(), 2);

        let one = store.search_exact("quick brown", 10, None).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].path, a.to_str().unwrap());

        let none = store.search_exact("zzz", 10, None).unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn rename_moves_body_remove_drops_row() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let a2 = tmp.path().join("a2.txt");
        fs::write(&a, "hello").unwrap();
        let (_dir, store) = open_store().await;
        let a_str = a.to_str().unwrap().to_string();
        let a2_str = a2.to_str().unwrap().to_string();

        store.add(&a_str, "hello", "txt", None).await.unwrap();
        store.rename(&a_str, &a2_str).await.unwrap();
        assert_eq!(store.get_body(&a2_str).unwrap(), "hello");
        assert!(store.get_body(&a_str).is_none());

        let before = store.stats().document_count;
        store.remove(&a2_str).await.unwrap();
        assert_eq!(store.stats().document_count, before - 1);
    }

    #[tokio::test]
    async fn search_metadata_filters_by_size_range() {
        let tmp = tempfile::tempdir().unwrap();
        let (_dir, store) = open_store().await;
        for (name, size) in [("small.txt", 100usize), ("mid.txt", 1_000), ("big.txt", 10_000)] {
            let path = tmp.path().join(name);
            fs::write(&path, vec![b'x'; size]).unwrap();
            store.add(path.to_str().unwrap(), "x", "txt", None).await.unwrap();
        }

        let filter = MetadataFilter { min_size: Some(500), max_size: Some(5_000), ..Default::default() };
        let rows = store.search_metadata(&filter, 10);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].path.ends_with("mid.txt"));
    }

    #[tokio::test]
    async fn open_backfills_modified_at_from_pre_migration_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        let path = file.to_str().unwrap().to_string();

        let index_dir = tmp.path().join(".index");
        fs::create_dir_all(&index_dir).unwrap();
        let legacy_json = serde_json::json!([{
            "id": 1,
            "path": path,
            "content_hash": "deadbeef",
            "size": 5,
            "created_at": 1000,
            "indexed_at": 1234,
            "file_type": "txt",
        }]);
        fs::write(sidecar_path(&index_dir), serde_json::to_string(&legacy_json).unwrap()).unwrap();

        let store = Store::open(&index_dir).unwrap();
        let rows = store.list_all();
        assert_eq!(rows.len(), 1);
        let expected_mtime = stat_times(&file).1;
        assert_eq!(rows[0].modified_at, expected_mtime);
    }

    #[tokio::test]
    async fn open_falls_back_to_indexed_at_when_path_missing_on_backfill() {
        let tmp = tempfile::tempdir().unwrap();
        let index_dir = tmp.path().join(".index");
        fs::create_dir_all(&index_dir).unwrap();
        let legacy_json = serde_json::json!([{
            "id": 1,
            "path": tmp.path().join("gone.txt").to_string_lossy(),
            "content_hash": "deadbeef",
            "size": 5,
            "created_at": 1000,
            "indexed_at": 4242,
            "file_type": "txt",
        }]);
        fs::write(sidecar_path(&index_dir), serde_json::to_string(&legacy_json).unwrap()).unwrap();

        let store = Store::open(&index_dir).unwrap();
        let rows = store.list_all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].modified_at, 4242);
    }
}
