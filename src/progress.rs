//! Process-wide progress state for `index_directory` sessions. Writes take a mutex
//! internally (`DashMap` shards); starting a new session atomically replaces the
//! "current" pointer so stale sessions are prunable by replacement rather than by
//! explicit cleanup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Starting,
    Indexing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub status: SessionStatus,
    pub processed: usize,
    pub total: usize,
    pub current_file: Option<String>,
    pub speed: f64,
    pub elapsed_time: f64,
    pub eta: f64,
    pub errors: Vec<String>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            processed: 0,
            total: 0,
            current_file: None,
            speed: 0.0,
            elapsed_time: 0.0,
            eta: 0.0,
            errors: Vec::new(),
        }
    }
}

/// One `index_directory` invocation's progress, updated by the pipeline's writer task
/// and polled by HTTP handlers.
pub struct Session {
    pub id: Uuid,
    started: std::time::Instant,
    status: parking_lot::RwLock<SessionStatus>,
    processed: AtomicU64,
    total: AtomicU64,
    current_file: parking_lot::RwLock<Option<String>>,
    errors: parking_lot::RwLock<Vec<String>>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: std::time::Instant::now(),
            status: parking_lot::RwLock::new(SessionStatus::Starting),
            processed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            current_file: parking_lot::RwLock::new(None),
            errors: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total as u64, Ordering::Relaxed);
        *self.status.write() = SessionStatus::Indexing;
    }

    pub fn record(&self, current_file: &str) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        *self.current_file.write() = Some(current_file.to_string());
    }

    pub fn record_error(&self, msg: String) {
        let mut errors = self.errors.write();
        errors.push(msg);
        let len = errors.len();
        if len > 5 {
            errors.remove(0);
        }
    }

    pub fn finish(&self, failed: bool) {
        *self.status.write() = if failed { SessionStatus::Failed } else { SessionStatus::Completed };
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let processed = self.processed.load(Ordering::Relaxed) as usize;
        let total = self.total.load(Ordering::Relaxed) as usize;
        let elapsed = self.started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 { processed as f64 / elapsed } else { 0.0 };
        let eta = if speed > 0.0 { (total.saturating_sub(processed)) as f64 / speed } else { 0.0 };
        ProgressSnapshot {
            status: *self.status.read(),
            processed,
            total,
            current_file: self.current_file.read().clone(),
            speed,
            elapsed_time: elapsed,
            eta,
            errors: self.errors.read().clone(),
        }
    }
}

#[derive(Default)]
pub struct ProgressRegistry {
    sessions: DashMap<Uuid, Arc<Session>>,
    current: parking_lot::RwLock<Option<Uuid>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session and atomically make it "current".
    pub fn start_session(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions.insert(session.id, Arc::clone(&session));
        *self.current.write() = Some(session.id);
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|e| Arc::clone(e.value()))
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        let id = (*self.current.read())?;
        self.get(id)
    }

    pub fn current_snapshot(&self) -> ProgressSnapshot {
        self.current().map(|s| s.snapshot()).unwrap_or_default()
    }
}
