//! Local, high-throughput document indexing and search engine — core library.
//!
//! Re-exports the building blocks (`Store`, `IndexingPipeline`, `QueryEngine`,
//! `ParserRegistry`, the file walker) so both the HTTP server and the CLI dispatch onto
//! the same library crate.

pub mod config;
pub mod document;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod routes;
pub mod server;
pub mod similarity;
pub mod state;
pub mod store;
pub mod walker;
pub mod watcher;

pub use config::AppConfig;
pub use document::{DocumentMeta, MatchMethod, ResultRow, StoreStats};
pub use error::{AppError, AppResult};
pub use pipeline::{IndexDirectoryOptions, IndexSummary, IndexingPipeline};
pub use query::{QueryEngine, SearchResponse, SearchType};
pub use store::{MetadataFilter, Store};
