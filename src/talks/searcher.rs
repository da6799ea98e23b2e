use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::IndexSettings;
use crate::error::Result;
use crate::models::{fields, parse_index_date, ScoreDoc, StoredDocument, TalkResult, TopDocs};
use crate::query::{QueryContext, QueryExecutor, QueryNode, QueryStringParser};
use crate::segment::IndexStore;

use super::highlight::build_snippet;

/// Runs query strings against the latest commit and hydrates talk results
#[derive(Clone, Debug)]
pub struct Searcher {
    store: Arc<IndexStore>,
    settings: IndexSettings,
}

impl Searcher {
    pub fn new(store: Arc<IndexStore>, settings: IndexSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Parse a query string against the configured default field
    pub fn parse(&self, query: &str) -> Result<Box<dyn QueryNode>> {
        QueryStringParser::new(query, self.store.analyzers(), &self.settings.default_field)?.parse()
    }

    /// Top hits for a query string, at most `limit`
    pub fn top_docs(&self, query: &str, limit: usize) -> Result<TopDocs> {
        let node = self.parse(query)?;
        let ctx = QueryContext::new(self.store.open_reader()?);
        QueryExecutor::search(node.as_ref(), &ctx, limit)
    }

    /// Search talks, best hits first, up to `max_results`
    pub fn search(&self, query: &str) -> Result<Vec<TalkResult>> {
        let node = self.parse(query)?;
        let ctx = QueryContext::new(self.store.open_reader()?);
        let top = QueryExecutor::search(node.as_ref(), &ctx, self.settings.max_results)?;

        let mut terms = BTreeSet::new();
        node.collect_terms(&ctx, &mut terms);

        let snapshot = ctx.snapshot();
        let content_analyzer = self.store.analyzers().for_field(fields::CONTENT);
        let results = top
            .hits
            .iter()
            .map(|hit| {
                let doc = snapshot.document(hit.doc)?;
                let content = doc.get(fields::CONTENT).unwrap_or_default();
                let snippet =
                    build_snippet(content_analyzer, content, &terms, self.settings.snippet_length);
                Ok(hydrate(hit, doc, snippet))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(query, total_hits = top.total_hits, returned = results.len(), "Searched talks");
        Ok(results)
    }

    /// Every category of every live talk in the latest commit
    pub fn all_categories(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.open_reader()?.stored_values(fields::CATEGORY))
    }
}

fn hydrate(hit: &ScoreDoc, doc: &StoredDocument, snippet: String) -> TalkResult {
    let owned = |name: &str| -> Vec<String> {
        doc.get_all(name).into_iter().map(str::to_string).collect()
    };
    TalkResult {
        doc_id: hit.doc,
        score: hit.score,
        path: doc.get(fields::PATH).unwrap_or_default().to_string(),
        title: doc.get(fields::TITLE).unwrap_or_default().to_string(),
        speakers: owned(fields::SPEAKER),
        date: doc.get(fields::DATE).and_then(parse_index_date),
        snippet,
        categories: owned(fields::CATEGORY),
    }
}
