use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::types::*;
use crate::error::TalkdexError;

use super::router::AppState;

/// Error wrapper for API handlers
pub enum ApiError {
    Talkdex(TalkdexError),
}

impl From<TalkdexError> for ApiError {
    fn from(e: TalkdexError) -> Self {
        ApiError::Talkdex(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Talkdex(e) = self;
        let status = match &e {
            TalkdexError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            TalkdexError::QueryParse { .. }
            | TalkdexError::InvalidDocument(_)
            | TalkdexError::InvalidTalk { .. } => StatusCode::BAD_REQUEST,
            TalkdexError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            TalkdexError::Configuration(_)
            | TalkdexError::Storage(_)
            | TalkdexError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::from(&e))).into_response()
    }
}

/// Search talks with a Lucene-style query string
///
/// Categories are always listed. Without a query there are no results; a
/// failing query degrades to no results plus an error.
pub async fn lucene_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LuceneParams>,
) -> Result<Json<SearchView>, ApiError> {
    let categories = state.searcher.all_categories()?.into_iter().collect();

    let Some(query) = params.query else {
        return Ok(Json(SearchView {
            query: NO_QUERY.to_string(),
            results: Vec::new(),
            categories,
            error: None,
        }));
    };

    let (results, error) = match state.searcher.search(&query) {
        Ok(results) => {
            debug!(query = %query, hits = results.len(), "Search");
            (results, None)
        }
        Err(TalkdexError::Closed) => return Err(TalkdexError::Closed.into()),
        Err(e) => {
            warn!(query = %query, error = %e, "Search failed");
            (Vec::new(), Some(ErrorResponse::from(&e)))
        }
    };

    Ok(Json(SearchView {
        query,
        results,
        categories,
        error,
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let closed = state.searcher.store().is_closed();
    let status = if closed {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(HealthResponse {
            status: if closed { "closed" } else { "healthy" }.to_string(),
            version: crate::VERSION.to_string(),
        }),
    )
        .into_response()
}
