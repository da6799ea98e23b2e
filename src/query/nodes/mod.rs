//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for
//! the query types the query string language produces.

mod bool_query;
mod phrase_query;
mod prefix_query;
mod term_query;

pub use bool_query::BoolQuery;
pub use phrase_query::PhraseQuery;
pub use prefix_query::{PrefixQuery, DEFAULT_MAX_EXPANSIONS};
pub use term_query::TermQuery;
