use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::talks::Searcher;

use super::handlers::*;

/// Application state shared across all handlers
pub struct AppState {
    pub searcher: Searcher,
}

impl AppState {
    pub fn new(searcher: Searcher) -> Self {
        Self { searcher }
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/lucene", get(lucene_search))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
