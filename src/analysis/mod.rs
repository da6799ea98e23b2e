//! Analyzer pipeline: tokenizer → lowercase → stop words → normalization → stemming
//!
//! Each `AnalyzerKind` fixes which filters run. The same analyzer must be used
//! for a field at index and query time for terms to match exactly.

mod analyzer;
mod normalizer;
mod stemmer;
mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerKind, FieldAnalyzers, Term, Token};
pub use normalizer::normalize_german;
pub use stemmer::GermanLightStemmer;
pub use tokenizer::{RawToken, Tokenizer};
