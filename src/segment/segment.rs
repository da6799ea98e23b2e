//! Immutable segment produced by a commit

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{DocNo, FieldPostings, Posting, SegmentId};
use crate::analysis::Term;
use crate::error::Result;
use crate::models::{DocId, StoredDocument};

/// An immutable slice of the index covering a contiguous doc id range
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    id: SegmentId,
    /// First doc id in this segment
    base: DocId,
    /// Stored fields, indexed by docno
    docs: Vec<StoredDocument>,
    /// Field to term to postings
    fields: BTreeMap<String, FieldPostings>,
}

impl Segment {
    pub fn new(
        id: SegmentId,
        base: DocId,
        docs: Vec<StoredDocument>,
        fields: BTreeMap<String, FieldPostings>,
    ) -> Self {
        Self {
            id,
            base,
            docs,
            fields,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn base(&self) -> DocId {
        self.base
    }

    pub fn doc_count(&self) -> u32 {
        self.docs.len() as u32
    }

    /// One past the last doc id in this segment
    pub fn end(&self) -> DocId {
        DocId(self.base.as_u32() + self.doc_count())
    }

    pub fn contains(&self, id: DocId) -> bool {
        id >= self.base && id < self.end()
    }

    /// Translate a docno into a global doc id
    pub fn doc_id(&self, posting: &Posting) -> DocId {
        DocId(self.base.as_u32() + posting.docno.as_u32())
    }

    /// Stored fields of a document in this segment
    pub fn doc(&self, id: DocId) -> Option<&StoredDocument> {
        if !self.contains(id) {
            return None;
        }
        self.docs.get((id.as_u32() - self.base.as_u32()) as usize)
    }

    pub fn docs(&self) -> &[StoredDocument] {
        &self.docs
    }

    /// Posting of one document for an exact term
    pub fn posting(&self, field: &str, term: &Term, id: DocId) -> Option<&Posting> {
        if !self.contains(id) {
            return None;
        }
        let docno = DocNo(id.as_u32() - self.base.as_u32());
        let postings = self.postings(field, term)?;
        postings
            .binary_search_by_key(&docno, |p| p.docno)
            .ok()
            .map(|idx| &postings[idx])
    }

    /// Postings for an exact term
    pub fn postings(&self, field: &str, term: &Term) -> Option<&[Posting]> {
        self.fields
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
    }

    /// Terms of a field starting with `prefix`, in term order
    pub fn terms_with_prefix<'a>(
        &'a self,
        field: &str,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(move |terms| {
                terms
                    .range(Term::new(prefix)..)
                    .map(|(term, _)| term)
                    .take_while(move |term| term.as_str().starts_with(prefix))
            })
    }

    /// Names of the inverted fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, AnalyzerKind, FieldAnalyzers};
    use crate::models::{Document, FieldOptions};
    use crate::segment::buffer::WriteBuffer;

    fn build(base: u32, titles: &[&str]) -> Segment {
        let analyzers = FieldAnalyzers::new(Analyzer::of(AnalyzerKind::Simple));
        let mut buffer = WriteBuffer::new();
        for title in titles {
            buffer
                .add_document(
                    Document::new().with("title", *title, FieldOptions::STORED_INDEXED),
                    &analyzers,
                )
                .unwrap();
        }
        buffer.build_segment(SegmentId(1), DocId(base))
    }

    #[test]
    fn test_doc_id_range() {
        let segment = build(10, &["Apache Camel", "Apache Karaf"]);
        assert_eq!(segment.base(), DocId(10));
        assert_eq!(segment.end(), DocId(12));
        assert!(segment.contains(DocId(11)));
        assert!(!segment.contains(DocId(12)));
        assert!(!segment.contains(DocId(9)));
        assert_eq!(
            segment.doc(DocId(11)).and_then(|d| d.get("title")),
            Some("Apache Karaf")
        );
        assert!(segment.doc(DocId(3)).is_none());
    }

    #[test]
    fn test_postings_map_to_global_ids() {
        let segment = build(10, &["Apache Camel", "Apache Karaf"]);
        let postings = segment.postings("title", &Term::from("apache")).unwrap();
        let ids: Vec<DocId> = postings.iter().map(|p| segment.doc_id(p)).collect();
        assert_eq!(ids, vec![DocId(10), DocId(11)]);
    }

    #[test]
    fn test_posting_lookup_by_doc() {
        let segment = build(10, &["Apache Camel", "Karaf", "Apache Apache"]);
        let apache = Term::from("apache");
        assert_eq!(
            segment
                .posting("title", &apache, DocId(12))
                .map(|p| p.term_frequency),
            Some(2)
        );
        assert!(segment.posting("title", &apache, DocId(11)).is_none());
        assert!(segment.posting("title", &apache, DocId(2)).is_none());
    }

    #[test]
    fn test_terms_with_prefix() {
        let segment = build(0, &["Kaffee Karaf Kamel Apache"]);
        let terms: Vec<&str> = segment
            .terms_with_prefix("title", "ka")
            .map(Term::as_str)
            .collect();
        assert_eq!(terms, vec!["kaffee", "kamel", "karaf"]);
        assert_eq!(segment.terms_with_prefix("missing", "ka").count(), 0);
    }

    #[test]
    fn test_bytes_round_trip() {
        let segment = build(3, &["Apache Camel"]);
        let restored = Segment::from_bytes(&segment.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.id(), segment.id());
        assert_eq!(restored.base(), DocId(3));
        assert!(restored.postings("title", &Term::from("camel")).is_some());
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Segment::from_bytes(&[1, 2, 3]).is_err());
    }
}
