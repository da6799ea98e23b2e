//! Fixtures for query unit tests

use crate::analysis::{Analyzer, AnalyzerKind, FieldAnalyzers};
use crate::models::{DocId, Document, FieldOptions};
use crate::query::context::QueryContext;
use crate::segment::IndexStore;

/// Context over committed documents; `deleted` ids are tombstoned in a second commit
pub(crate) fn context_with_deleted(
    analyzers: &FieldAnalyzers,
    docs: Vec<Document>,
    deleted: &[u32],
) -> QueryContext {
    let store = IndexStore::in_memory(analyzers.clone());
    for doc in docs {
        store.add_document(doc).unwrap();
    }
    store.commit().unwrap();

    for id in deleted {
        store.delete_document(DocId(*id)).unwrap();
    }
    store.commit().unwrap();

    QueryContext::new(store.open_reader().unwrap())
}

pub(crate) fn context_with_docs(analyzers: &FieldAnalyzers, docs: Vec<Document>) -> QueryContext {
    context_with_deleted(analyzers, docs, &[])
}

/// Context over documents with a single stored and indexed `title`
pub(crate) fn context_with(
    analyzers: &FieldAnalyzers,
    titles: &[&str],
    deleted: &[u32],
) -> QueryContext {
    let docs = titles
        .iter()
        .map(|title| Document::new().with("title", *title, FieldOptions::STORED_INDEXED))
        .collect();
    context_with_deleted(analyzers, docs, deleted)
}

/// Like [`context_with`], analyzing with the `Simple` analyzer
pub(crate) fn context_with_titles(titles: &[&str], deleted: &[u32]) -> QueryContext {
    context_with(
        &FieldAnalyzers::new(Analyzer::of(AnalyzerKind::Simple)),
        titles,
        deleted,
    )
}
