//! Optional ambient filesystem watcher. Wired only onto the pipeline's single-file
//! `update_file`/`remove_file` entry points — it never triggers a directory rescan, so
//! it stays outside the indexing pipeline's producer/worker/writer topology.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult, DebouncedEvent};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::SKIP_ENTRIES;
use crate::pipeline::IndexingPipeline;
use crate::state::ServerEvent;

/// Minimum interval between re-index operations for the same file (ms). Prevents rapid
/// saves from triggering redundant re-indexing.
const REINDEX_COOLDOWN_MS: u64 = 5000;

struct ReindexCooldownTracker {
    last_reindex: HashMap<String, Instant>,
}

impl ReindexCooldownTracker {
    fn new() -> Self {
        Self { last_reindex: HashMap::new() }
    }

    fn should_reindex(&mut self, path: &str) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_reindex.get(path) {
            if now.duration_since(*last) < Duration::from_millis(REINDEX_COOLDOWN_MS) {
                return false;
            }
        }
        self.last_reindex.insert(path.to_string(), now);
        true
    }

    fn cleanup_stale(&mut self) {
        let cutoff = Instant::now() - Duration::from_secs(60);
        self.last_reindex.retain(|_, v| *v > cutoff);
    }
}

fn is_skipped(path: &std::path::Path) -> bool {
    path.components().any(|c| {
        if let std::path::Component::Normal(name) = c {
            SKIP_ENTRIES.iter().any(|skip| skip.eq_ignore_ascii_case(&name.to_string_lossy()))
        } else {
            false
        }
    })
}

fn classify(event: &DebouncedEvent) -> &'static str {
    use notify::EventKind;
    match event.kind {
        EventKind::Create(_) => "create",
        EventKind::Modify(_) => "modify",
        EventKind::Remove(_) => "remove",
        EventKind::Access(_) => "access",
        _ => "other",
    }
}

pub struct FileWatcher {
    _debouncer: notify_debouncer_full::Debouncer<notify::RecommendedWatcher, notify_debouncer_full::FileIdMap>,
}

impl FileWatcher {
    pub fn start(
        root: &std::path::Path,
        debounce_ms: u64,
        pipeline: Arc<IndexingPipeline>,
        event_tx: broadcast::Sender<ServerEvent>,
    ) -> Result<Self, notify::Error> {
        let cooldown = Arc::new(Mutex::new(ReindexCooldownTracker::new()));
        let tick_counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let rt_handle = tokio::runtime::Handle::try_current().ok();

        let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let count = tick_counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    if count % 50 == 0 {
                        cooldown.lock().cleanup_stale();
                    }

                    let mut file_events: HashMap<PathBuf, String> = HashMap::new();
                    for event in &events {
                        let change_type = classify(event);
                        if change_type == "access" || change_type == "other" {
                            continue;
                        }
                        for path in &event.paths {
                            if is_skipped(path) {
                                continue;
                            }
                            file_events.insert(path.clone(), change_type.to_string());
                        }
                    }

                    for (path, change_type) in file_events {
                        let path_str = path.to_string_lossy().into_owned();
                        if !cooldown.lock().should_reindex(&path_str) {
                            continue;
                        }

                        let _ = event_tx.send(ServerEvent::FileChanged { path: path_str.clone(), change_type: change_type.clone() });

                        if let Some(handle) = &rt_handle {
                            let pipeline = Arc::clone(&pipeline);
                            let p = path.clone();
                            let ct = change_type.clone();
                            handle.spawn(async move {
                                let result = if ct == "remove" {
                                    pipeline.remove_file(&p).await
                                } else {
                                    pipeline.update_file(&p).await
                                };
                                if let Err(e) = result {
                                    tracing::debug!("incremental reindex skipped for {}: {e}", p.display());
                                }
                            });
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!("file watcher error: {e:?}");
                    }
                }
            }
        })?;

        debouncer.watch(root, RecursiveMode::Recursive)?;
        info!("watching {} (debounce: {debounce_ms}ms)", root.display());
        Ok(Self { _debouncer: debouncer })
    }
}
