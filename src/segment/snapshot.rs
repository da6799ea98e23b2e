//! Point-in-time read views of the index

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use roaring::RoaringBitmap;

use super::directory::Directory;
use super::manifest::{ManifestEntry, SegmentManifest, MANIFEST_FILE};
use super::segment::Segment;
use super::types::Posting;
use crate::analysis::Term;
use crate::error::{Result, TalkdexError};
use crate::models::{DocId, StoredDocument};

/// An immutable view of one commit
///
/// Holds its segments by `Arc`, so later commits never change what an open
/// snapshot sees and dropping the last handle releases the segments.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    /// Ascending by base doc id, covering 0..max_doc
    segments: Vec<Arc<Segment>>,
    deleted: RoaringBitmap,
    max_doc: u32,
}

impl Snapshot {
    pub(crate) fn new(
        generation: u64,
        segments: Vec<Arc<Segment>>,
        deleted: RoaringBitmap,
        max_doc: u32,
    ) -> Self {
        Self {
            generation,
            segments,
            deleted,
            max_doc,
        }
    }

    /// Snapshot of an index with no commits
    pub fn empty() -> Self {
        Self::default()
    }

    /// Open the latest commit in a directory read-only
    pub fn open(directory: &dyn Directory) -> Result<Self> {
        match load_manifest(directory)? {
            Some(manifest) => Self::from_manifest(directory, &manifest),
            None => Ok(Self::empty()),
        }
    }

    pub(crate) fn from_manifest(directory: &dyn Directory, manifest: &SegmentManifest) -> Result<Self> {
        let segments = manifest
            .segments
            .iter()
            .map(|entry| load_segment(directory, entry).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(
            manifest.generation,
            segments,
            manifest.deleted.iter().copied().collect(),
            manifest.max_doc(),
        ))
    }

    /// Commit generation this snapshot belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of doc ids ever assigned, deleted ones included
    pub fn max_doc(&self) -> u32 {
        self.max_doc
    }

    /// Number of live documents
    pub fn num_docs(&self) -> u32 {
        self.max_doc - self.deleted.len() as u32
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    pub fn deleted(&self) -> &RoaringBitmap {
        &self.deleted
    }

    pub fn is_deleted(&self, id: DocId) -> bool {
        self.deleted.contains(id.as_u32())
    }

    /// All live doc ids
    pub fn live_docs(&self) -> RoaringBitmap {
        let mut live = RoaringBitmap::new();
        live.insert_range(0..self.max_doc);
        live - &self.deleted
    }

    fn segment_for(&self, id: DocId) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.base() <= id);
        let segment = self.segments.get(idx.checked_sub(1)?)?;
        segment.contains(id).then_some(segment.as_ref())
    }

    /// Stored fields of a live document
    pub fn doc(&self, id: DocId) -> Option<&StoredDocument> {
        if self.is_deleted(id) {
            return None;
        }
        self.segment_for(id)?.doc(id)
    }

    /// Like [`Snapshot::doc`], failing with `DocumentNotFound`
    pub fn document(&self, id: DocId) -> Result<&StoredDocument> {
        self.doc(id).ok_or(TalkdexError::DocumentNotFound(id))
    }

    /// Live documents in doc id order
    pub fn documents(&self) -> impl Iterator<Item = &StoredDocument> + '_ {
        self.segments
            .iter()
            .flat_map(|s| s.docs())
            .filter(move |d| !self.is_deleted(d.id))
    }

    /// Live postings for an exact term, ascending by doc id
    pub fn postings<'a>(
        &'a self,
        field: &str,
        term: &Term,
    ) -> impl Iterator<Item = (DocId, &'a Posting)> + 'a {
        let lists: Vec<(&'a Segment, &'a [Posting])> = self
            .segments
            .iter()
            .filter_map(|s| s.postings(field, term).map(|p| (s.as_ref(), p)))
            .collect();
        lists
            .into_iter()
            .flat_map(|(segment, postings)| postings.iter().map(move |p| (segment.doc_id(p), p)))
            .filter(move |(id, _)| !self.is_deleted(*id))
    }

    /// Posting of one live document for an exact term
    pub fn posting(&self, field: &str, term: &Term, id: DocId) -> Option<&Posting> {
        if self.is_deleted(id) {
            return None;
        }
        self.segment_for(id)?.posting(field, term, id)
    }

    /// Number of live documents containing a term
    pub fn doc_freq(&self, field: &str, term: &Term) -> u32 {
        self.postings(field, term).count() as u32
    }

    /// Distinct terms of a field starting with `prefix`
    pub fn terms_with_prefix(&self, field: &str, prefix: &str) -> BTreeSet<Term> {
        self.segments
            .iter()
            .flat_map(|s| s.terms_with_prefix(field, prefix))
            .cloned()
            .collect()
    }

    /// Distinct stored values of a field over live documents
    pub fn stored_values(&self, field: &str) -> BTreeSet<String> {
        self.documents()
            .flat_map(|d| d.get_all(field))
            .map(str::to_string)
            .collect()
    }
}

/// Read the live manifest, if the directory holds a commit
pub(crate) fn load_manifest(directory: &dyn Directory) -> Result<Option<SegmentManifest>> {
    if !directory.exists(MANIFEST_FILE) {
        return Ok(None);
    }
    let bytes = directory.read(MANIFEST_FILE)?;
    SegmentManifest::from_bincode(&bytes).map(Some)
}

/// Read and verify one segment file
pub(crate) fn load_segment(directory: &dyn Directory, entry: &ManifestEntry) -> Result<Segment> {
    let bytes = directory.read(&entry.file_name())?;
    let checksum = crc32fast::hash(&bytes);
    if checksum != entry.checksum {
        return Err(corrupt(format!(
            "{} checksum mismatch: expected {:08x}, found {:08x}",
            entry.id, entry.checksum, checksum
        )));
    }

    let segment = Segment::from_bytes(&bytes)?;
    if segment.id() != entry.id
        || segment.base() != entry.base
        || segment.doc_count() != entry.doc_count
    {
        return Err(corrupt(format!("{} does not match manifest", entry.id)));
    }
    Ok(segment)
}

fn corrupt(message: String) -> TalkdexError {
    TalkdexError::Storage(io::Error::new(io::ErrorKind::InvalidData, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, AnalyzerKind, FieldAnalyzers};
    use crate::models::{Document, FieldOptions};
    use crate::segment::buffer::WriteBuffer;
    use crate::segment::types::SegmentId;

    fn segment(id: u64, base: u32, titles: &[&str]) -> Arc<Segment> {
        let analyzers = FieldAnalyzers::new(Analyzer::of(AnalyzerKind::Simple));
        let mut buffer = WriteBuffer::new();
        for title in titles {
            let doc = Document::new()
                .with("title", *title, FieldOptions::STORED_INDEXED)
                .with("category", "Java", FieldOptions::STORED_ONLY);
            buffer.add_document(doc, &analyzers).unwrap();
        }
        Arc::new(buffer.build_segment(SegmentId(id), DocId(base)))
    }

    fn two_segment_snapshot(deleted: &[u32]) -> Snapshot {
        Snapshot::new(
            2,
            vec![
                segment(0, 0, &["Apache Camel", "Apache Karaf"]),
                segment(1, 2, &["Rust Apache"]),
            ],
            deleted.iter().copied().collect(),
            3,
        )
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert_eq!(snapshot.num_docs(), 0);
        assert_eq!(snapshot.max_doc(), 0);
        assert!(snapshot.doc(DocId(0)).is_none());
        assert_eq!(snapshot.postings("title", &Term::from("apache")).count(), 0);
    }

    #[test]
    fn test_postings_span_segments() {
        let snapshot = two_segment_snapshot(&[]);
        let ids: Vec<DocId> = snapshot
            .postings("title", &Term::from("apache"))
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![DocId(0), DocId(1), DocId(2)]);
        assert_eq!(snapshot.doc_freq("title", &Term::from("rust")), 1);
    }

    #[test]
    fn test_deleted_docs_skipped() {
        let snapshot = two_segment_snapshot(&[1]);
        assert_eq!(snapshot.num_docs(), 2);
        assert!(snapshot.is_deleted(DocId(1)));
        assert!(snapshot.doc(DocId(1)).is_none());
        assert!(matches!(
            snapshot.document(DocId(1)),
            Err(TalkdexError::DocumentNotFound(DocId(1)))
        ));
        assert_eq!(snapshot.doc_freq("title", &Term::from("apache")), 2);
        assert!(snapshot
            .posting("title", &Term::from("apache"), DocId(1))
            .is_none());
        assert!(snapshot
            .posting("title", &Term::from("apache"), DocId(2))
            .is_some());
        assert_eq!(snapshot.documents().count(), 2);
        assert_eq!(snapshot.live_docs().iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_doc_lookup_by_id() {
        let snapshot = two_segment_snapshot(&[]);
        assert_eq!(
            snapshot.doc(DocId(2)).and_then(|d| d.get("title")),
            Some("Rust Apache")
        );
        assert!(snapshot.doc(DocId(3)).is_none());
    }

    #[test]
    fn test_stored_values_and_prefix_terms() {
        let snapshot = two_segment_snapshot(&[]);
        let categories = snapshot.stored_values("category");
        assert_eq!(categories.into_iter().collect::<Vec<_>>(), vec!["Java"]);

        let terms = snapshot.terms_with_prefix("title", "ka");
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), vec![Term::from("karaf")]);
    }

    #[test]
    fn test_open_without_manifest_is_empty() {
        let dir = crate::segment::RamDirectory::new();
        let snapshot = Snapshot::open(&dir).unwrap();
        assert_eq!(snapshot.generation(), 0);
        assert_eq!(snapshot.num_docs(), 0);
    }

    #[test]
    fn test_load_segment_detects_corruption() {
        let dir = crate::segment::RamDirectory::new();
        let seg = segment(0, 0, &["Apache"]);
        let bytes = seg.to_bytes().unwrap();
        dir.write(&seg.id().file_name(), &bytes).unwrap();

        let entry = ManifestEntry {
            id: seg.id(),
            base: DocId(0),
            doc_count: 1,
            checksum: crc32fast::hash(&bytes),
        };
        assert!(load_segment(&dir, &entry).is_ok());

        let bad = ManifestEntry {
            checksum: entry.checksum ^ 1,
            ..entry.clone()
        };
        assert!(matches!(
            load_segment(&dir, &bad),
            Err(TalkdexError::Storage(_))
        ));
    }
}
