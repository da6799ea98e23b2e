//! Phrase query - matches exact phrases with optional proximity/slop
//!
//! A phrase query matches documents containing its terms at the expected
//! relative positions. With a slop of zero every term must sit exactly where
//! the phrase puts it; with a slop of `n` each term may be up to `n`
//! positions away from its expected position, measured from the first term.

use std::collections::BTreeSet;

use roaring::RoaringBitmap;

use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;

/// Query that matches a sequence of analyzed terms
#[derive(Clone, Debug)]
pub struct PhraseQuery {
    /// Field to search in
    pub field: String,
    /// Terms with their position relative to the first term
    pub terms: Vec<(Term, u32)>,
    /// Maximum distance of a term from its expected position
    pub slop: u32,
    /// Boost factor for scoring
    pub boost: f32,
}

impl PhraseQuery {
    /// Create a phrase of adjacent terms
    pub fn new<T: Into<Term>>(field: impl Into<String>, terms: impl IntoIterator<Item = T>) -> Self {
        Self::with_positions(
            field,
            terms
                .into_iter()
                .zip(0u32..)
                .map(|(term, offset)| (term.into(), offset)),
        )
    }

    /// Create a phrase from terms and their relative positions
    ///
    /// Positions are rebased so the first term sits at 0; gaps left by
    /// removed stop words are kept.
    pub fn with_positions(
        field: impl Into<String>,
        terms: impl IntoIterator<Item = (Term, u32)>,
    ) -> Self {
        let terms: Vec<(Term, u32)> = terms.into_iter().collect();
        let base = terms.first().map(|(_, pos)| *pos).unwrap_or(0);
        Self {
            field: field.into(),
            terms: terms
                .into_iter()
                .map(|(term, pos)| (term, pos.saturating_sub(base)))
                .collect(),
            slop: 0,
            boost: 1.0,
        }
    }

    /// Set the slop (maximum positions between terms)
    ///
    /// - slop=0: exact phrase match (terms must be adjacent)
    /// - slop=1: each term may be one position off
    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Get the cache key for this query
    pub fn cache_key(&self) -> String {
        let terms: Vec<String> = self
            .terms
            .iter()
            .map(|(term, pos)| format!("{}@{}", term, pos))
            .collect();
        format!("phrase:{}:{}:{}", self.field, terms.join(","), self.slop)
    }

    /// Number of phrase occurrences in one document
    fn phrase_frequency(&self, ctx: &QueryContext, doc: DocId) -> u32 {
        let mut positions: Vec<(&[u32], u32)> = Vec::with_capacity(self.terms.len());
        for (term, offset) in &self.terms {
            match ctx.posting(&self.field, term, doc) {
                Some(posting) => positions.push((posting.positions.as_slice(), *offset)),
                None => return 0,
            }
        }

        let Some(((anchors, _), rest)) = positions.split_first() else {
            return 0;
        };
        let slop = self.slop;

        anchors
            .iter()
            .filter(|&&start| {
                rest.iter().all(|(candidates, offset)| {
                    let expected = start + offset;
                    if slop == 0 {
                        candidates.binary_search(&expected).is_ok()
                    } else {
                        let low = expected.saturating_sub(slop);
                        let high = expected.saturating_add(slop);
                        let idx = candidates.partition_point(|&p| p < low);
                        candidates.get(idx).is_some_and(|&p| p <= high)
                    }
                })
            })
            .count() as u32
    }
}

impl QueryNode for PhraseQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        ctx.get_or_cache_filter(&self.cache_key(), || {
            if self.terms.is_empty() {
                return Ok(RoaringBitmap::new());
            }

            // Candidates contain every term, rarest first
            let mut terms: Vec<&Term> = self.terms.iter().map(|(term, _)| term).collect();
            terms.sort_by_key(|term| ctx.doc_frequency(&self.field, term));

            let mut candidates: Option<RoaringBitmap> = None;
            for term in terms {
                let docs = ctx.postings_bitmap(&self.field, term);
                let next = match candidates {
                    Some(current) => current & docs,
                    None => docs,
                };
                if next.is_empty() {
                    return Ok(next);
                }
                candidates = Some(next);
            }

            Ok(candidates
                .unwrap_or_default()
                .iter()
                .filter(|&id| self.phrase_frequency(ctx, DocId(id)) > 0)
                .collect())
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext) -> f64 {
        self.terms
            .iter()
            .map(|(term, _)| ctx.doc_frequency(&self.field, term))
            .min()
            .unwrap_or(0) as f64
    }

    fn query_type(&self) -> &'static str {
        "phrase"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, doc: DocId) -> Option<f32> {
        let freq = self.phrase_frequency(ctx, doc);
        (freq > 0).then(|| freq as f32 * self.boost)
    }

    fn collect_terms(&self, _ctx: &QueryContext, terms: &mut BTreeSet<Term>) {
        terms.extend(self.terms.iter().map(|(term, _)| term.clone()));
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
