//! Lucene-style query string parser
//!
//! Supports syntax like:
//! - `apache` (default field)
//! - `speaker:schneider AND title:camel`
//! - `"apache camel"~2`
//! - `title:apa*`
//! - `+camel -rust`, `camel NOT rust`
//! - `speaker:(ada OR grace)^2`
//!
//! # Example
//!
//! ```rust
//! use talkdex::analysis::{Analyzer, AnalyzerKind, FieldAnalyzers};
//! use talkdex::query::query_string::QueryStringParser;
//!
//! let analyzers = FieldAnalyzers::new(Analyzer::of(AnalyzerKind::German));
//! let mut parser = QueryStringParser::new("title:camel AND NOT karaf", &analyzers, "title").unwrap();
//! let query = parser.parse().unwrap();
//! assert_eq!(query.query_type(), "bool");
//! ```

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token};
pub use parser::{DefaultOperator, QueryStringParser, MAX_NESTING_DEPTH};
