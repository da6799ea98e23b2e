use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::document::DocId;

/// A matching document with its score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreDoc {
    pub doc: DocId,
    pub score: f32,
}

impl ScoreDoc {
    pub fn new(doc: DocId, score: f32) -> Self {
        Self { doc, score }
    }

    /// Result order: descending score, ties by ascending doc id
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc.cmp(&other.doc))
    }
}

/// Ranked hits of a query
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopDocs {
    /// Number of matching documents before truncation
    pub total_hits: usize,
    pub hits: Vec<ScoreDoc>,
}

impl TopDocs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|h| h.doc).collect()
    }
}

/// A search hit hydrated from the stored fields of a talk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TalkResult {
    pub doc_id: DocId,
    pub score: f32,
    pub path: String,
    pub title: String,
    pub speakers: Vec<String>,
    pub date: Option<NaiveDate>,
    pub snippet: String,
    pub categories: Vec<String>,
}
