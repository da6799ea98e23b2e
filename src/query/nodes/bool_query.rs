//! Boolean query - combines multiple clauses with required, optional and prohibited semantics

use std::collections::BTreeSet;

use roaring::RoaringBitmap;

use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;

/// Boolean query combining multiple clauses
///
/// The boolean query supports three types of clauses:
/// - `must`: All clauses must match (`+term`, `a AND b`). Contributes to score.
/// - `should`: Optional clauses (`a b`, `a OR b`). When there are no `must`
///   clauses at least one of them has to match. Contributes to score.
/// - `must_not`: No clause may match (`-term`, `NOT term`). Does not contribute
///   to score.
///
/// A query with only `must_not` clauses matches nothing.
#[derive(Clone, Debug)]
pub struct BoolQuery {
    /// Clauses that must match (AND, scoring)
    pub must: Vec<Box<dyn QueryNode>>,
    /// Clauses where at least one should match (OR, scoring)
    pub should: Vec<Box<dyn QueryNode>>,
    /// Clauses that must not match (NOT, no scoring)
    pub must_not: Vec<Box<dyn QueryNode>>,
    /// Boost factor for scoring
    pub boost: f32,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BoolQuery {
    /// Create a new empty boolean query
    pub fn new() -> Self {
        Self {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            boost: 1.0,
        }
    }

    /// Add a must clause
    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    /// Add a should clause
    pub fn should(mut self, query: impl QueryNode + 'static) -> Self {
        self.should.push(Box::new(query));
        self
    }

    /// Add a must_not clause
    pub fn must_not(mut self, query: impl QueryNode + 'static) -> Self {
        self.must_not.push(Box::new(query));
        self
    }

    /// Add a must clause (boxed)
    pub fn must_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must.push(query);
        self
    }

    /// Add a should clause (boxed)
    pub fn should_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.should.push(query);
        self
    }

    /// Add a must_not clause (boxed)
    pub fn must_not_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must_not.push(query);
        self
    }

    /// Set boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Check if this is an empty query
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Get total number of clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len()
    }

    fn scoring_clauses(&self) -> impl Iterator<Item = &Box<dyn QueryNode>> {
        self.must.iter().chain(self.should.iter())
    }
}

impl QueryNode for BoolQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        let mut result = if !self.must.is_empty() {
            // Intersect cheapest first so empty results stop early
            let mut ordered: Vec<&Box<dyn QueryNode>> = self.must.iter().collect();
            ordered.sort_by(|a, b| a.estimate_cost(ctx).total_cmp(&b.estimate_cost(ctx)));

            let mut acc: Option<RoaringBitmap> = None;
            for query in ordered {
                let matches = query.execute(ctx)?;
                let next = match acc {
                    Some(current) => current & matches,
                    None => matches,
                };
                if next.is_empty() {
                    return Ok(next);
                }
                acc = Some(next);
            }
            acc.unwrap_or_default()
        } else {
            let mut union = RoaringBitmap::new();
            for query in &self.should {
                union |= query.execute(ctx)?;
            }
            union
        };

        for query in &self.must_not {
            if result.is_empty() {
                break;
            }
            result -= query.execute(ctx)?;
        }

        Ok(result)
    }

    fn estimate_cost(&self, ctx: &QueryContext) -> f64 {
        let must_not_cost: f64 = self.must_not.iter().map(|q| q.estimate_cost(ctx)).sum();

        // Required clauses bound the result by the most selective one
        let base_cost = if self.must.is_empty() {
            self.should.iter().map(|q| q.estimate_cost(ctx)).sum()
        } else {
            self.must
                .iter()
                .map(|q| q.estimate_cost(ctx))
                .fold(f64::MAX, f64::min)
        };

        base_cost + must_not_cost * 0.1
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn is_scoring(&self) -> bool {
        self.scoring_clauses().any(|q| q.is_scoring())
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, doc: DocId) -> Option<f32> {
        let mut total_score = 0.0f32;
        let mut matched = false;

        for query in self.scoring_clauses() {
            if let Some(score) = query.score(ctx, doc) {
                total_score += score;
                matched = true;
            }
        }

        matched.then(|| total_score * self.boost)
    }

    fn collect_terms(&self, ctx: &QueryContext, terms: &mut BTreeSet<Term>) {
        for query in self.scoring_clauses() {
            query.collect_terms(ctx, terms);
        }
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
