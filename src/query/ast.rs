//! Abstract Syntax Tree for query representation
//!
//! This module defines the core `QueryNode` trait that all query types implement,
//! providing a unified interface for matching, scoring and cost estimation.

use std::collections::BTreeSet;
use std::fmt::Debug;

use roaring::RoaringBitmap;

use super::context::QueryContext;
use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;

/// Core trait for all query nodes in the AST
///
/// Query nodes form a tree that mirrors the parsed query string. Each node
/// can be executed against a `QueryContext` to produce the set of matching
/// doc ids of its snapshot.
pub trait QueryNode: Send + Sync + Debug {
    /// Execute the query and return matching doc ids as a bitmap
    ///
    /// Deleted documents never appear in the result.
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap>;

    /// Estimate the execution cost of this query
    ///
    /// Boolean queries intersect their required clauses cheapest first.
    fn estimate_cost(&self, ctx: &QueryContext) -> f64;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;

    /// Whether this query produces scores (vs just filtering)
    fn is_scoring(&self) -> bool {
        true
    }

    /// Get the boost factor for this query
    fn boost(&self) -> f32 {
        1.0
    }

    /// Calculate the score contribution for a matching document
    ///
    /// Returns None if the document doesn't match.
    fn score(&self, _ctx: &QueryContext, _doc: DocId) -> Option<f32> {
        None
    }

    /// Add the analyzed terms this query looks for to `terms`
    ///
    /// Prohibited clauses contribute nothing. Used to place result snippets.
    fn collect_terms(&self, _ctx: &QueryContext, _terms: &mut BTreeSet<Term>) {}

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A query that matches all live documents
#[derive(Clone, Debug)]
pub struct MatchAllQuery {
    pub boost: f32,
}

impl MatchAllQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl Default for MatchAllQuery {
    fn default() -> Self {
        Self { boost: 1.0 }
    }
}

impl QueryNode for MatchAllQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        Ok(ctx.snapshot().live_docs())
    }

    fn estimate_cost(&self, ctx: &QueryContext) -> f64 {
        ctx.max_doc() as f64
    }

    fn query_type(&self) -> &'static str {
        "match_all"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, doc: DocId) -> Option<f32> {
        (!ctx.snapshot().is_deleted(doc) && doc.as_u32() < ctx.max_doc()).then_some(self.boost)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

/// A query that matches no documents
#[derive(Clone, Debug, Default)]
pub struct MatchNoneQuery;

impl QueryNode for MatchNoneQuery {
    fn execute(&self, _ctx: &QueryContext) -> Result<RoaringBitmap> {
        Ok(RoaringBitmap::new())
    }

    fn estimate_cost(&self, _ctx: &QueryContext) -> f64 {
        0.0
    }

    fn query_type(&self) -> &'static str {
        "match_none"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
