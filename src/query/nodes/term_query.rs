//! Term query - exact match on a field

use std::collections::BTreeSet;

use roaring::RoaringBitmap;

use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;

/// Query that matches documents containing an exact term in a field
///
/// The term must already be analyzed; the query looks it up in the postings
/// of every segment and scores by term frequency.
#[derive(Clone, Debug)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact term to match
    pub term: Term,
    /// Boost factor for scoring
    pub boost: f32,
}

impl TermQuery {
    /// Create a new term query
    pub fn new(field: impl Into<String>, term: impl Into<Term>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Get the cache key for this term
    pub fn cache_key(&self) -> String {
        format!("term:{}:{}", self.field, self.term)
    }
}

impl QueryNode for TermQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        ctx.get_or_cache_filter(&self.cache_key(), || {
            Ok(ctx.postings_bitmap(&self.field, &self.term))
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext) -> f64 {
        ctx.doc_frequency(&self.field, &self.term) as f64
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, doc: DocId) -> Option<f32> {
        let tf = ctx.term_frequency(&self.field, &self.term, doc)?;
        Some(tf as f32 * self.boost)
    }

    fn collect_terms(&self, _ctx: &QueryContext, terms: &mut BTreeSet<Term>) {
        terms.insert(self.term.clone());
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
