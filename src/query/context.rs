//! Query execution context
//!
//! The `QueryContext` provides access to a snapshot and caching during query execution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use roaring::RoaringBitmap;

use crate::analysis::Term;
use crate::error::Result;
use crate::models::DocId;
use crate::segment::{Posting, Snapshot};

/// Filter cache for reusing expensive filter computations
pub type FilterCache = Arc<RwLock<HashMap<String, RoaringBitmap>>>;

/// Prefix expansions, keyed by `field:prefix:max_expansions`
type ExpansionCache = Arc<RwLock<HashMap<String, Arc<Vec<Term>>>>>;

/// Query execution context over one snapshot
///
/// Caches live exactly as long as the context, so they can never go stale
/// across commits.
pub struct QueryContext {
    snapshot: Arc<Snapshot>,

    /// Filter result cache (keyed by canonical query representation)
    filter_cache: FilterCache,

    expansions: ExpansionCache,
}

impl QueryContext {
    /// Create a new query context
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self {
            snapshot,
            filter_cache: Arc::new(RwLock::new(HashMap::new())),
            expansions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of doc ids ever assigned in the snapshot
    pub fn max_doc(&self) -> u32 {
        self.snapshot.max_doc()
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u32 {
        self.snapshot.num_docs()
    }

    /// Number of live documents containing a term
    pub fn doc_frequency(&self, field: &str, term: &Term) -> u32 {
        self.snapshot.doc_freq(field, term)
    }

    /// Posting of one document for a term
    pub fn posting(&self, field: &str, term: &Term, doc: DocId) -> Option<&Posting> {
        self.snapshot.posting(field, term, doc)
    }

    /// Term frequency of a term in one document's field
    pub fn term_frequency(&self, field: &str, term: &Term, doc: DocId) -> Option<u32> {
        self.posting(field, term, doc).map(|p| p.term_frequency)
    }

    /// Live documents containing a term
    pub fn postings_bitmap(&self, field: &str, term: &Term) -> RoaringBitmap {
        self.snapshot
            .postings(field, term)
            .map(|(id, _)| id.as_u32())
            .collect()
    }

    /// Terms of a field starting with `prefix`, at most `max_expansions`
    pub fn expand_prefix(&self, field: &str, prefix: &str, max_expansions: usize) -> Arc<Vec<Term>> {
        let key = format!("{}:{}:{}", field, prefix, max_expansions);
        if let Some(cached) = self.expansions.read().get(&key) {
            return Arc::clone(cached);
        }

        let terms: Arc<Vec<Term>> = Arc::new(
            self.snapshot
                .terms_with_prefix(field, prefix)
                .into_iter()
                .take(max_expansions)
                .collect(),
        );
        self.expansions.write().insert(key, Arc::clone(&terms));
        terms
    }

    /// Get or compute a cached filter result
    pub fn get_or_cache_filter<F>(&self, cache_key: &str, compute: F) -> Result<RoaringBitmap>
    where
        F: FnOnce() -> Result<RoaringBitmap>,
    {
        // Check cache first
        if let Some(cached) = self.filter_cache.read().get(cache_key) {
            return Ok(cached.clone());
        }

        // Compute and cache
        let result = compute()?;
        self.filter_cache
            .write()
            .insert(cache_key.to_string(), result.clone());
        Ok(result)
    }

    #[cfg(test)]
    pub(crate) fn cached_filters(&self) -> usize {
        self.filter_cache.read().len()
    }

    #[cfg(test)]
    pub(crate) fn clear_filter_cache(&self) {
        self.filter_cache.write().clear();
        self.expansions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::context_with_titles;

    #[test]
    fn test_context_counts() {
        let ctx = context_with_titles(&["Apache Camel", "Apache Karaf", "Rust"], &[2]);
        assert_eq!(ctx.max_doc(), 3);
        assert_eq!(ctx.num_docs(), 2);
        assert_eq!(ctx.doc_frequency("title", &Term::from("apache")), 2);
        assert_eq!(ctx.doc_frequency("title", &Term::from("rust")), 0);
    }

    #[test]
    fn test_term_frequency() {
        let ctx = context_with_titles(&["Apache Apache Camel", "Karaf"], &[]);
        let apache = Term::from("apache");
        assert_eq!(ctx.term_frequency("title", &apache, DocId(0)), Some(2));
        assert_eq!(ctx.term_frequency("title", &apache, DocId(1)), None);
        assert_eq!(
            ctx.postings_bitmap("title", &apache).iter().collect::<Vec<_>>(),
            vec![0]
        );
    }

    #[test]
    fn test_expand_prefix() {
        let ctx = context_with_titles(&["Kaffee Karaf", "Kamel Apache"], &[]);
        let terms = ctx.expand_prefix("title", "ka", 10);
        assert_eq!(terms.len(), 3);
        assert_eq!(ctx.expand_prefix("title", "ka", 10), terms);

        ctx.clear_filter_cache();
        assert_eq!(ctx.expand_prefix("title", "kar", 1).as_slice(), &[Term::from("karaf")]);
    }

    #[test]
    fn test_filter_cache() {
        let ctx = context_with_titles(&["Apache"], &[]);

        // First call should compute
        let result1 = ctx
            .get_or_cache_filter("test_filter", || {
                let mut bitmap = RoaringBitmap::new();
                bitmap.insert(1);
                bitmap.insert(2);
                Ok(bitmap)
            })
            .unwrap();

        assert_eq!(result1.len(), 2);
        assert_eq!(ctx.cached_filters(), 1);

        // Second call should use cache (this closure should not be called)
        let result2 = ctx
            .get_or_cache_filter("test_filter", || {
                panic!("This should not be called - cache should be used");
            })
            .unwrap();

        assert_eq!(result2.len(), 2);

        ctx.clear_filter_cache();
        assert_eq!(ctx.cached_filters(), 0);
    }
}
