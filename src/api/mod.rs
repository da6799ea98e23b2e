//! HTTP API over the talk searcher

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::ApiError;
pub use router::{create_router, AppState};
pub use types::{ErrorResponse, HealthResponse, LuceneParams, SearchView};
