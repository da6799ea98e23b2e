use std::path::PathBuf;

use thiserror::Error;

use crate::models::DocId;

/// Main error type for Talkdex operations
#[derive(Error, Debug)]
pub enum TalkdexError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Query parse error at position {position}: {message}")]
    QueryParse { position: usize, message: String },

    #[error("Index store is closed")]
    Closed,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid talk in {path:?}: {message}")]
    InvalidTalk { path: PathBuf, message: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(DocId),
}

/// Result type alias for Talkdex operations
pub type Result<T> = std::result::Result<T, TalkdexError>;

impl TalkdexError {
    pub(crate) fn query_parse(position: usize, message: impl Into<String>) -> Self {
        TalkdexError::QueryParse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_talk(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        TalkdexError::InvalidTalk {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable label for API responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            TalkdexError::Configuration(_) => "configuration_error",
            TalkdexError::Storage(_) => "storage_error",
            TalkdexError::Serialization(_) => "serialization_error",
            TalkdexError::QueryParse { .. } => "query_parse_error",
            TalkdexError::Closed => "closed_store",
            TalkdexError::InvalidDocument(_) => "invalid_document",
            TalkdexError::InvalidTalk { .. } => "invalid_talk",
            TalkdexError::DocumentNotFound(_) => "document_not_found",
        }
    }

    /// Check if this error indicates a transient failure that the caller could retry
    pub fn is_retriable(&self) -> bool {
        match self {
            TalkdexError::Storage(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
