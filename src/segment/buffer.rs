//! Write buffer for documents added since the last commit
//!
//! Documents are analyzed when added; postings accumulate per (field, term)
//! in docno order. Commit turns the buffer into an immutable segment.

use std::collections::{BTreeMap, HashMap};

use roaring::RoaringBitmap;

use super::segment::Segment;
use super::types::{DocNo, FieldPostings, Posting, SegmentId, POSITION_INCREMENT_GAP};
use crate::analysis::{FieldAnalyzers, Term};
use crate::error::Result;
use crate::models::{DocId, Document, StoredDocument};

/// In-memory buffer of uncommitted writes
#[derive(Debug, Default)]
pub struct WriteBuffer {
    /// Pending documents in insertion order
    docs: Vec<Document>,
    /// Field to term to postings
    postings: BTreeMap<String, FieldPostings>,
    /// Committed documents to tombstone on the next commit
    deletes: RoaringBitmap,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze and buffer a document
    ///
    /// Returns the docno the document will have within the next segment.
    pub fn add_document(&mut self, doc: Document, analyzers: &FieldAnalyzers) -> Result<DocNo> {
        doc.validate()?;
        let docno = DocNo(self.docs.len() as u32);

        // field -> term -> positions, merged across values and same-named fields
        let mut inverted: HashMap<&str, HashMap<Term, Vec<u32>>> = HashMap::new();
        let mut next_position: HashMap<&str, u32> = HashMap::new();

        for field in doc.fields().iter().filter(|f| f.is_indexed()) {
            let analyzer = analyzers.for_field(&field.name);
            let terms = inverted.entry(field.name.as_str()).or_default();
            let offset = next_position.entry(field.name.as_str()).or_insert(0);

            for value in &field.values {
                let mut end = 0;
                for token in analyzer.tokens(value) {
                    end = end.max(token.position + 1);
                    terms
                        .entry(token.term)
                        .or_default()
                        .push(*offset + token.position);
                }
                *offset += end + POSITION_INCREMENT_GAP;
            }
        }

        for (field, terms) in inverted {
            let field_postings = self.postings.entry(field.to_string()).or_default();
            for (term, positions) in terms {
                field_postings
                    .entry(term)
                    .or_default()
                    .push(Posting::with_positions(docno, positions));
            }
        }

        self.docs.push(doc);
        Ok(docno)
    }

    /// Buffer a tombstone for a committed document
    pub fn delete_document(&mut self, id: DocId) {
        self.deletes.insert(id.as_u32());
    }

    pub fn doc_count(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn deletes(&self) -> &RoaringBitmap {
        &self.deletes
    }

    /// True when there is nothing to commit
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() && self.deletes.is_empty()
    }

    /// Build an immutable segment from the pending documents
    ///
    /// The buffer is left untouched so a failed commit can be retried.
    pub fn build_segment(&self, id: SegmentId, base: DocId) -> Segment {
        let docs = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| StoredDocument::from_document(DocId(base.as_u32() + i as u32), doc))
            .collect();
        Segment::new(id, base, docs, self.postings.clone())
    }

    /// Drop every document buffered at or after docno `len`
    ///
    /// Tombstones are kept.
    pub fn truncate(&mut self, len: u32) {
        if len >= self.doc_count() {
            return;
        }
        self.docs.truncate(len as usize);
        for field_postings in self.postings.values_mut() {
            for postings in field_postings.values_mut() {
                while postings.last().is_some_and(|p| p.docno.as_u32() >= len) {
                    postings.pop();
                }
            }
            field_postings.retain(|_, postings| !postings.is_empty());
        }
        self.postings.retain(|_, field_postings| !field_postings.is_empty());
    }

    /// Clear the buffer (after a successful commit)
    pub fn clear(&mut self) {
        self.docs.clear();
        self.postings.clear();
        self.deletes.clear();
    }
}
