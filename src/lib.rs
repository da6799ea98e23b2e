pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod segment;
pub mod talks;

pub use analysis::{Analyzer, AnalyzerKind, FieldAnalyzers, Term, Token};
pub use api::{create_router, AppState};
pub use config::{AnalyzerConfig, IndexSettings, ServerConfig};
pub use error::{Result, TalkdexError};
pub use models::*;
pub use query::{parse_query, QueryContext, QueryExecutor, QueryNode, QueryStringParser};
pub use segment::{Directory, FsDirectory, IndexStore, RamDirectory, Snapshot};
pub use talks::{Indexer, Searcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
