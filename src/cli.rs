//! Thin CLI shell over the library crate. Mirrors the interactive command dispatcher's
//! subcommand surface; all real work happens in `Store`/`IndexingPipeline`/`QueryEngine`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use filesearch::config::AppConfig;
use filesearch::pipeline::IndexDirectoryOptions;
use filesearch::query::SearchType;
use filesearch::state::AppState;

#[derive(Parser)]
#[command(name = "filesearch", version, about = "Local document indexing and search engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory.
    Index {
        directory: PathBuf,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        include_all_files: bool,
    },
    /// Run a search.
    Search {
        query: String,
        #[arg(long = "type", default_value = "exact")]
        search_type: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long = "min-score", default_value_t = filesearch::config::DEFAULT_MIN_FUZZY_SCORE)]
        min_score: f32,
    },
    /// Multi-predicate search over content and/or path.
    Advanced {
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long = "types", value_delimiter = ',')]
        types: Vec<String>,
        #[arg(long)]
        fuzzy: bool,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Read-eval-print loop over `search`.
    Interactive,
    /// Print store statistics.
    Stats,
    /// Move files matching a path query to a destination directory.
    Move {
        query: String,
        dest: PathBuf,
        #[arg(long = "type", default_value = "path")]
        search_type: String,
        #[arg(long)]
        confirm: bool,
    },
    /// Incrementally re-index a single file.
    Update { path: PathBuf },
    /// Remove a single file from the index.
    Remove { path: PathBuf },
    /// List supported extensions.
    Formats,
    /// Run the HTTP server.
    Serve,
}

fn parse_search_type(s: &str) -> SearchType {
    match s {
        "fuzzy" => SearchType::Fuzzy,
        "path" => SearchType::Path,
        "hybrid" => SearchType::Hybrid,
        _ => SearchType::Exact,
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState::new(config.clone()).await?;
            let addr: std::net::SocketAddr = config.listen_addr.parse()?;
            filesearch::routes::health::init_start_time();
            filesearch::routes::health::init_shutdown_notify();
            let app = filesearch::server::create_app(state);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("filesearch listening on {addr}");
            axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
        }

        Commands::Index { directory, force, workers, include_all_files } => {
            let state = AppState::new(config).await?;
            let opts = IndexDirectoryOptions { force, include_all_files, workers, session: None, cancel: None };
            let summary = state.pipeline.index_directory(&directory, opts).await?;
            println!(
                "indexed {}/{} files in {:.2}s",
                summary.indexed_files, summary.total_files, summary.processing_time
            );
        }

        Commands::Search { query, search_type, limit, min_score } => {
            let state = AppState::new(config).await?;
            let response = state.query_engine.search(&query, parse_search_type(&search_type), limit, min_score, None)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Advanced { content, path, types, fuzzy, limit } => {
            let state = AppState::new(config).await?;
            let file_types = (!types.is_empty()).then_some(types);
            let results = state.query_engine.search_advanced(content.as_deref(), path.as_deref(), file_types.as_deref(), fuzzy, limit)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Interactive => {
            use std::io::Write;
            let state = AppState::new(config).await?;
            let stdin = std::io::stdin();
            loop {
                print!("filesearch> ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                if stdin.read_line(&mut line)? == 0 {
                    break;
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                match state.query_engine.search(line, SearchType::Fuzzy, 10, state.config.min_fuzzy_score, None) {
                    Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }

        Commands::Stats => {
            let state = AppState::new(config).await?;
            println!("{}", serde_json::to_string_pretty(&state.store.stats())?);
        }

        Commands::Move { query, dest, search_type, confirm } => {
            let state = AppState::new(config).await?;
            let matches = match parse_search_type(&search_type) {
                SearchType::Path => state.store.search_path(&query, 100, None),
                _ => state.store.search_exact(&query, 100, None)?,
            };
            if matches.is_empty() {
                eprintln!("no matches for {query}");
                std::process::exit(1);
            }
            if !confirm {
                for m in &matches {
                    println!("would move {} -> {}", m.path, dest.display());
                }
                return Ok(());
            }
            std::fs::create_dir_all(&dest)?;
            for m in &matches {
                let src = PathBuf::from(&m.path);
                let Some(name) = src.file_name() else { continue };
                let target = dest.join(name);
                std::fs::rename(&src, &target)?;
                state.store.rename(&m.path, &target.to_string_lossy()).await?;
                println!("moved {} -> {}", m.path, target.display());
            }
        }

        Commands::Update { path } => {
            let state = AppState::new(config).await?;
            state.pipeline.update_file(&path).await?;
            println!("updated {}", path.display());
        }

        Commands::Remove { path } => {
            let state = AppState::new(config).await?;
            state.pipeline.remove_file(&path).await?;
            println!("removed {}", path.display());
        }

        Commands::Formats => {
            for ext in filesearch::config::SUPPORTED_EXTENSIONS {
                println!("{ext}");
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = async {
        tokio::signal::ctrl_c().await.expect("failed to install secondary Ctrl+C handler");
    };

    let http_shutdown = filesearch::routes::health::wait_for_shutdown();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received Ctrl+C, initiating shutdown"); },
        _ = terminate => { tracing::info!("received terminate signal, initiating shutdown"); },
        _ = http_shutdown => { tracing::info!("received HTTP shutdown request, initiating shutdown"); },
    }
}
