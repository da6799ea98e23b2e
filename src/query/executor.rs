//! Query executor for running queries against a snapshot
//!
//! The executor evaluates a query tree, scores every match and keeps the
//! best `limit` hits.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use roaring::RoaringBitmap;
use tracing::debug;

use crate::error::Result;
use crate::models::{DocId, ScoreDoc, TopDocs};
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;

/// Query executor for running queries
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute a query and return the top `limit` hits
    ///
    /// Hits are ordered by descending score, ties by ascending doc id.
    /// `total_hits` counts every match regardless of `limit`.
    pub fn search(query: &dyn QueryNode, ctx: &QueryContext, limit: usize) -> Result<TopDocs> {
        let start = Instant::now();

        let mut matches = query.execute(ctx)?;
        matches -= ctx.snapshot().deleted();
        let total_hits = matches.len() as usize;

        let hits = Self::collect_top_k(query, ctx, &matches, limit);

        debug!(
            query_type = query.query_type(),
            total_hits,
            returned = hits.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Executed query"
        );

        Ok(TopDocs { total_hits, hits })
    }

    /// Collect the top-k results by score
    fn collect_top_k(
        query: &dyn QueryNode,
        ctx: &QueryContext,
        matches: &RoaringBitmap,
        top_k: usize,
    ) -> Vec<ScoreDoc> {
        if matches.is_empty() || top_k == 0 {
            return Vec::new();
        }

        // The heap top is the worst hit kept so far
        let mut heap: BinaryHeap<Ranked> = BinaryHeap::with_capacity(top_k + 1);

        for id in matches.iter() {
            let doc = DocId(id);
            let score = query.score(ctx, doc).unwrap_or(0.0);
            let candidate = Ranked(ScoreDoc::new(doc, score));

            if heap.len() < top_k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

/// `ScoreDoc` ordered by rank: better hits compare lower
#[derive(Debug)]
struct Ranked(ScoreDoc);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}
