use serde::{Deserialize, Serialize};

/// Maximum allowed length for search queries (characters).
pub const MAX_SEARCH_QUERY_LENGTH: usize = 1000;

/// Batch size for writer commits during `index_directory` — matches the original
/// implementation's buffering threshold.
pub const DEFAULT_INDEX_BATCH_SIZE: usize = 10;

pub const DEFAULT_MIN_FUZZY_SCORE: f32 = 30.0;

/// Extensions for which a non-universal parser exists. Everything else still gets
/// indexed (metadata-only) in `include_all_files` mode via the universal fallback.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs",
    "rs", "py", "go", "java", "c", "cpp", "h", "hpp",
    "cs", "rb", "php", "swift", "kt", "scala",
    "html", "css", "scss", "less", "sass",
    "json", "yaml", "yml", "toml", "xml",
    "md", "mdx", "txt", "rst",
    "sql", "graphql", "gql",
    "sh", "bash", "zsh", "fish",
    "vue", "svelte", "astro",
    "lua", "zig", "dart",
    "r", "jl",
    "tf", "hcl", "proto",
    "env", "ini", "cfg", "conf",
];

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext)
}

/// Directory and filename components the walker never descends into or yields.
pub const SKIP_ENTRIES: &[&str] = &[
    ".git", ".svn", ".hg", "node_modules", "__pycache__", ".pytest_cache",
    "venv", ".venv", "env", ".env", "build", "dist", ".DS_Store", "Thumbs.db",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub listen_addr: String,
    pub data_dir: String,
    pub max_file_size_bytes: usize,
    pub index_batch_size: usize,
    pub workers: usize,
    pub min_fuzzy_score: f32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("FILESEARCH_PORT").unwrap_or_else(|_| "8420".to_string());

        let data_dir = std::env::var("FILESEARCH_DATA_DIR").unwrap_or_else(|_| {
            dirs::data_local_dir()
                .map(|d| d.join("filesearch").to_string_lossy().to_string())
                .unwrap_or_else(|| ".filesearch-data".to_string())
        });

        Self {
            listen_addr: format!("127.0.0.1:{}", port),
            data_dir,
            max_file_size_bytes: std::env::var("FILESEARCH_MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            index_batch_size: std::env::var("FILESEARCH_INDEX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INDEX_BATCH_SIZE),
            workers: std::env::var("FILESEARCH_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)),
            min_fuzzy_score: DEFAULT_MIN_FUZZY_SCORE,
        }
    }

    pub fn index_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.data_dir).join("documents.db")
    }
}

pub fn debug_enabled() -> bool {
    std::env::var("DEBUG").map(|v| v != "0" && !v.is_empty()).unwrap_or(false)
}
