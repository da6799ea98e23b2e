//! Query parsing and execution engine
//!
//! Queries are written in a Lucene-like syntax and parsed into a tree of
//! [`QueryNode`]s. Every node evaluates against a [`QueryContext`] bound to one
//! index snapshot:
//! - Term queries (single analyzed token)
//! - Phrase queries (exact or sloppy token sequences)
//! - Prefix queries (`apa*`)
//! - Boolean queries (`+`, `-`, `AND`, `OR`, `NOT`, groups)
//!
//! # Example
//!
//! ```text
//! speaker:schneider AND (title:"apache camel" OR content:karaf*)^2 -rust
//! ```

pub mod ast;
pub mod context;
pub mod executor;
pub mod nodes;
pub mod query_string;

#[cfg(test)]
pub(crate) mod testing;

pub use ast::{MatchAllQuery, MatchNoneQuery, QueryNode};
pub use context::QueryContext;
pub use executor::QueryExecutor;
pub use nodes::{BoolQuery, PhraseQuery, PrefixQuery, TermQuery, DEFAULT_MAX_EXPANSIONS};
pub use query_string::{DefaultOperator, QueryStringParser, MAX_NESTING_DEPTH};

use crate::analysis::FieldAnalyzers;
use crate::error::Result;

/// Parse a query string with the default `OR` operator
pub fn parse_query(
    input: &str,
    analyzers: &FieldAnalyzers,
    default_field: &str,
) -> Result<Box<dyn QueryNode>> {
    QueryStringParser::new(input, analyzers, default_field)?.parse()
}
