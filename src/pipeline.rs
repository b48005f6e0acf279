//! Coordinator → N parsing workers → one writer, connected by bounded queues.
//!
//! Workers run on a dedicated `rayon` pool (CPU/IO-bound parsing, no async runtime
//! needed); the writer lives in the calling async task and is the only thing that ever
//! touches `Store` mutably, satisfying the single-writer discipline. Backpressure comes
//! from the bounded `tokio::sync::mpsc` result channel: workers call `blocking_send`,
//! which blocks the rayon thread when the writer falls behind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::config::SUPPORTED_EXTENSIONS;
use crate::error::{AppError, AppResult};
use crate::parser::ParserRegistry;
use crate::progress::Session;
use crate::store::Store;
use crate::walker;

enum WorkerMsg {
    Ok { path: String, body: String, file_type: String, created_at: i64 },
    Err { path: String, reason: String },
}

#[derive(Debug, Default, Clone)]
pub struct IndexDirectoryOptions {
    pub force: bool,
    pub include_all_files: bool,
    pub workers: Option<usize>,
    pub session: Option<Arc<Session>>,
    pub cancel: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub indexed_files: usize,
    pub total_files: usize,
    pub processing_time: f64,
}

pub struct IndexingPipeline {
    store: Arc<Store>,
    parsers: Arc<ParserRegistry>,
    batch_size: usize,
    default_workers: usize,
    max_file_size: usize,
}

fn parse_one(parsers: &ParserRegistry, path: &Path) -> WorkerMsg {
    if !path.exists() {
        return WorkerMsg::Err { path: path.to_string_lossy().into_owned(), reason: "file not accessible".into() };
    }
    let created_at = std::fs::metadata(path)
        .ok()
        .and_then(|m| m.created().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    match parsers.parse(path) {
        Ok(result) => WorkerMsg::Ok {
            path: path.to_string_lossy().into_owned(),
            body: result.body,
            file_type: result.file_type,
            created_at,
        },
        Err(e) => WorkerMsg::Err { path: path.to_string_lossy().into_owned(), reason: e.to_string() },
    }
}

impl IndexingPipeline {
    pub fn new(store: Arc<Store>, parsers: Arc<ParserRegistry>, batch_size: usize, default_workers: usize, max_file_size: usize) -> Self {
        Self { store, parsers, batch_size, default_workers, max_file_size }
    }

    pub async fn index_directory(&self, root: &Path, opts: IndexDirectoryOptions) -> AppResult<IndexSummary> {
        let start = std::time::Instant::now();
        let root = root.to_path_buf();

        let candidates: Vec<PathBuf> = if opts.include_all_files {
            let max_size = self.max_file_size as u64;
            let root2 = root.clone();
            tokio::task::spawn_blocking(move || walker::discover_all(&root2, Some(max_size)))
                .await
                .map_err(|e| AppError::ResourceUnavailable(e.to_string()))?
        } else {
            let exts: Vec<String> = self
                .parsers
                .registered_extensions()
                .into_iter()
                .filter(|e| SUPPORTED_EXTENSIONS.contains(e))
                .map(|e| e.to_string())
                .collect();
            let root2 = root.clone();
            tokio::task::spawn_blocking(move || {
                let refs: Vec<&str> = exts.iter().map(|s| s.as_str()).collect();
                walker::discover(&root2, &refs)
            })
            .await
            .map_err(|e| AppError::ResourceUnavailable(e.to_string()))?
        };

        // Filtering: unless `force`, drop already-indexed-and-unchanged files. This
        // recomputes a content hash per candidate and dominates the filter stage's cost.
        let candidates: Vec<PathBuf> = if opts.force {
            candidates
        } else {
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || {
                candidates
                    .into_par_iter()
                    .filter(|p| !store.is_indexed(&p.to_string_lossy()))
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(|e| AppError::ResourceUnavailable(e.to_string()))?
        };

        let total = candidates.len();
        if let Some(session) = &opts.session {
            session.set_total(total);
        }

        let workers_n = opts.workers.unwrap_or(self.default_workers).max(1);
        let (result_tx, mut result_rx) = tokio::sync::mpsc::channel::<WorkerMsg>(workers_n * 4);

        let parsers = Arc::clone(&self.parsers);
        let cancel = opts.cancel.clone().unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let worker_candidates = candidates.clone();

        let worker_handle = tokio::task::spawn_blocking(move || {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers_n)
                .build()
                .expect("failed to build worker pool");
            pool.install(|| {
                worker_candidates.par_iter().for_each(|path| {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let msg = parse_one(&parsers, path);
                    let _ = result_tx.blocking_send(msg);
                });
            });
        });

        let mut buffer: Vec<(String, String, String, Option<i64>)> = Vec::with_capacity(self.batch_size);
        let mut indexed_files = 0usize;
        let mut had_errors = false;

        while let Some(msg) = result_rx.recv().await {
            match msg {
                WorkerMsg::Ok { path, body, file_type, created_at } => {
                    if let Some(session) = &opts.session {
                        session.record(&path);
                    }
                    buffer.push((path, body, file_type, Some(created_at)));
                }
                WorkerMsg::Err { path, reason } => {
                    had_errors = true;
                    let msg = format!("{path}: {reason}");
                    warn!("{msg}");
                    if let Some(session) = &opts.session {
                        session.record(&path);
                        session.record_error(msg);
                    }
                }
            }

            if buffer.len() >= self.batch_size {
                let batch = std::mem::take(&mut buffer);
                indexed_files += self.store.add_batch(&batch).await?;
            }
        }

        if !buffer.is_empty() {
            indexed_files += self.store.add_batch(&buffer).await?;
        }

        worker_handle.await.map_err(|e| AppError::ResourceUnavailable(e.to_string()))?;

        if let Some(session) = &opts.session {
            session.finish(had_errors && indexed_files == 0);
        }

        Ok(IndexSummary {
            indexed_files,
            total_files: total,
            processing_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Synchronous single-file path, bypassing the queueing entirely.
    pub async fn index_file(&self, path: &Path, include_all_files: bool) -> AppResult<bool> {
        let ext = crate::parser::file_type_of(path);
        if !include_all_files && !self.parsers.has_parser_for(&ext) {
            return Ok(false);
        }
        let result = self.parsers.parse(path)?;
        self.store.add(&path.to_string_lossy(), &result.body, &result.file_type, None).await
    }

    pub async fn update_file(&self, path: &Path) -> AppResult<bool> {
        self.index_file(path, true).await
    }

    pub async fn remove_file(&self, path: &Path) -> AppResult<bool> {
        self.store.remove(&path.to_string_lossy()).await
    }
}
