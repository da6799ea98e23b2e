//! Prefix query - matches terms starting with a prefix
//!
//! The prefix is expanded against the term dictionary of every segment in the
//! snapshot; the query then behaves like a disjunction of the expanded terms.

use std::collections::BTreeSet;

use roaring::RoaringBitmap;

use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;

/// Default cap on the number of expanded terms
pub const DEFAULT_MAX_EXPANSIONS: usize = 1024;

/// Query that matches terms starting with a prefix
#[derive(Clone, Debug)]
pub struct PrefixQuery {
    /// Field to search in
    pub field: String,
    /// Normalized prefix to match
    pub prefix: String,
    /// Maximum number of terms to expand
    pub max_expansions: usize,
    /// Boost factor for scoring
    pub boost: f32,
}

impl PrefixQuery {
    /// Create a new prefix query
    pub fn new(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prefix: prefix.into(),
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            boost: 1.0,
        }
    }

    /// Set the maximum number of terms to expand
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Get the cache key for this query
    pub fn cache_key(&self) -> String {
        format!("prefix:{}:{}:{}", self.field, self.prefix, self.max_expansions)
    }
}

impl QueryNode for PrefixQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        ctx.get_or_cache_filter(&self.cache_key(), || {
            let terms = ctx.expand_prefix(&self.field, &self.prefix, self.max_expansions);
            let mut results = RoaringBitmap::new();
            for term in terms.iter() {
                results |= ctx.postings_bitmap(&self.field, term);
            }
            Ok(results)
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext) -> f64 {
        ctx.expand_prefix(&self.field, &self.prefix, self.max_expansions)
            .iter()
            .map(|term| ctx.doc_frequency(&self.field, term) as f64)
            .sum()
    }

    fn query_type(&self) -> &'static str {
        "prefix"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, doc: DocId) -> Option<f32> {
        let tf: u32 = ctx
            .expand_prefix(&self.field, &self.prefix, self.max_expansions)
            .iter()
            .filter_map(|term| ctx.term_frequency(&self.field, term, doc))
            .sum();
        (tf > 0).then(|| tf as f32 * self.boost)
    }

    fn collect_terms(&self, ctx: &QueryContext, terms: &mut BTreeSet<Term>) {
        terms.extend(
            ctx.expand_prefix(&self.field, &self.prefix, self.max_expansions)
                .iter()
                .cloned(),
        );
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
