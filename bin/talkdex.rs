use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use talkdex::{
    AnalyzerKind, AppState, FieldAnalyzers, FsDirectory, IndexSettings, IndexStore, Indexer,
    Searcher, ServerConfig,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "talkdex")]
#[command(about = "Conference talk indexing and search", long_about = None)]
struct Args {
    /// Directory holding the index
    #[arg(long, env = "TALKDEX_INDEX_DIR", default_value = "./index", global = true)]
    index_dir: PathBuf,

    /// Analyzer for free-text fields (standard, simple, german-light, german)
    #[arg(long, env = "TALKDEX_ANALYZER", default_value = "german", global = true)]
    analyzer: AnalyzerKind,

    /// Field searched by unqualified query terms
    #[arg(long, env = "TALKDEX_DEFAULT_FIELD", default_value = "title", global = true)]
    default_field: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index all talk property files of a directory
    Index {
        /// Directory with `*.properties` files
        dir: PathBuf,

        /// Add to the existing index instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Serve the search API
    Serve {
        /// HTTP bind address
        #[arg(long, env = "TALKDEX_BIND_ADDR", default_value = "127.0.0.1:8080")]
        bind_addr: String,

        /// Maximum number of results per search
        #[arg(long, env = "TALKDEX_MAX_RESULTS", default_value = "100")]
        max_results: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Starting Talkdex v{}", talkdex::VERSION);

    let settings = IndexSettings::default()
        .with_analyzer(args.analyzer)
        .with_default_field(args.default_field.clone());

    match args.command {
        Command::Index { dir, append } => index(&args.index_dir, settings, &dir, append),
        Command::Serve {
            bind_addr,
            max_results,
        } => {
            let config = ServerConfig::new(bind_addr, args.index_dir.clone());
            serve(config, settings.with_max_results(max_results)).await
        }
    }
}

fn open_store(index_dir: &Path, settings: &IndexSettings, create: bool) -> Result<Arc<IndexStore>> {
    settings.validate()?;
    let analyzers = FieldAnalyzers::from_settings(settings)?;
    let directory = Arc::new(
        FsDirectory::open(index_dir)
            .with_context(|| format!("failed to open index directory {}", index_dir.display()))?,
    );
    let store = if create {
        IndexStore::create(directory, analyzers)?
    } else {
        IndexStore::open(directory, analyzers)?
    };
    Ok(Arc::new(store))
}

fn index(index_dir: &Path, settings: IndexSettings, dir: &Path, append: bool) -> Result<()> {
    info!("Index settings:");
    info!("  Index directory: {:?}", index_dir);
    info!("  Analyzer: {}", settings.analyzer.kind.name());
    info!("  Mode: {}", if append { "append" } else { "create" });

    let store = open_store(index_dir, &settings, !append)?;
    let indexer = Indexer::new(store.clone());
    let count = indexer
        .index_directory(dir)
        .with_context(|| format!("failed to index {}", dir.display()))?;

    info!(
        talks = count,
        docs = store.num_docs(),
        generation = store.generation(),
        "Indexing finished"
    );
    store.close();
    Ok(())
}

async fn serve(config: ServerConfig, settings: IndexSettings) -> Result<()> {
    let store = open_store(&config.index_dir, &settings, false)?;
    if store.num_docs() == 0 {
        warn!("Index at {:?} is empty", config.index_dir);
    }
    info!(
        docs = store.num_docs(),
        generation = store.generation(),
        "Index opened"
    );

    let app = talkdex::create_router(AppState::new(Searcher::new(store.clone(), settings)));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("HTTP API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal, gracefully shutting down");
        })
        .await?;

    store.close();
    Ok(())
}
