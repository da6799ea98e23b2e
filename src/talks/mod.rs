//! Talk indexing and search on top of the index store
//!
//! - [`Indexer`] maps talks to documents and commits them in batches
//! - [`Searcher`] parses query strings and hydrates [`TalkResult`](crate::models::TalkResult)s
//! - [`properties`] reads talks from Java-style property files

mod highlight;
mod indexer;
pub mod properties;
mod searcher;

pub use highlight::build_snippet;
pub use indexer::{talk_files, Indexer, TALK_FILE_EXTENSION};
pub use properties::{Properties, PROPERTY_DATE_FORMAT};
pub use searcher::Searcher;
