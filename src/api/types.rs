use serde::{Deserialize, Serialize};

use crate::models::TalkResult;

/// Query shown for a request without a query string
pub const NO_QUERY: &str = "-";

/// Query parameters of `GET /lucene`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LuceneParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// Search page model
///
/// A query that cannot be parsed or executed still yields a response: no
/// results and `error` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<TalkResult>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub error: Option<ErrorResponse>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// API Error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::error::TalkdexError> for ErrorResponse {
    fn from(e: &crate::error::TalkdexError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}
