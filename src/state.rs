use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::parser::ParserRegistry;
use crate::pipeline::IndexingPipeline;
use crate::progress::ProgressRegistry;
use crate::query::QueryEngine;
use crate::store::Store;

/// Events broadcast over the optional progress/notification channel. The HTTP layer may
/// relay these to WebSocket clients; the core only produces them.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "index_started")]
    IndexingStarted,
    #[serde(rename = "index_progress")]
    IndexingProgress { processed: usize, total: usize },
    #[serde(rename = "index_complete")]
    IndexingCompleted { total_files: usize, duration_ms: u64 },
    #[serde(rename = "index_error")]
    IndexingError { error: String },
    #[serde(rename = "file_changed")]
    FileChanged { path: String, change_type: String },
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Store>,
    pub pipeline: Arc<IndexingPipeline>,
    pub query_engine: Arc<QueryEngine>,
    pub progress: Arc<ProgressRegistry>,
    pub event_tx: broadcast::Sender<ServerEvent>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let (event_tx, _) = broadcast::channel(1024);

        tokio::fs::create_dir_all(&config.data_dir).await?;
        let store = Arc::new(Store::open(&config.index_path())?);
        let parsers = Arc::new(ParserRegistry::new());
        let pipeline = Arc::new(IndexingPipeline::new(
            Arc::clone(&store),
            parsers,
            config.index_batch_size,
            config.workers,
            config.max_file_size_bytes,
        ));
        let query_engine = Arc::new(QueryEngine::new(Arc::clone(&store)));
        let progress = Arc::new(ProgressRegistry::new());

        Ok(Self { config, store, pipeline, query_engine, progress, event_tx })
    }
}
