//! Index store: single writer, snapshot readers
//!
//! Writes go into a [`WriteBuffer`] guarded by a mutex. `commit` turns the
//! buffer into a segment, persists it through the [`Directory`] and then
//! publishes a new [`Snapshot`]. Readers load the current snapshot without
//! taking the writer lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use roaring::RoaringBitmap;
use tracing::{debug, info, warn};

use super::buffer::WriteBuffer;
use super::directory::{Directory, RamDirectory};
use super::manifest::{ManifestHolder, SegmentManifest, MANIFEST_FILE, MANIFEST_TMP_FILE};
use super::snapshot::{load_manifest, Snapshot};
use super::types::SegmentId;
use crate::analysis::FieldAnalyzers;
use crate::error::{Result, TalkdexError};
use crate::models::{DocId, Document};

/// Owner of all documents and postings of one index
pub struct IndexStore {
    directory: Arc<dyn Directory>,
    analyzers: FieldAnalyzers,
    writer: Mutex<WriteBuffer>,
    manifest: ManifestHolder,
    snapshot: ArcSwap<Snapshot>,
    closed: AtomicBool,
}

impl IndexStore {
    /// Open a store, reloading the latest commit if the directory has one
    pub fn open(directory: Arc<dyn Directory>, analyzers: FieldAnalyzers) -> Result<Self> {
        let manifest = load_manifest(directory.as_ref())?.unwrap_or_default();
        let snapshot = Snapshot::from_manifest(directory.as_ref(), &manifest)?;
        info!(
            generation = manifest.generation,
            segments = manifest.segment_count(),
            docs = snapshot.num_docs(),
            "Opened index store"
        );
        Ok(Self::with_state(directory, analyzers, manifest, snapshot))
    }

    /// Create an empty store, ignoring anything already in the directory
    ///
    /// Old files are left alone until the first commit replaces the
    /// manifest, then removed.
    pub fn create(directory: Arc<dyn Directory>, analyzers: FieldAnalyzers) -> Result<Self> {
        let mut manifest = SegmentManifest::new();
        // Never reuse a segment file name still referenced by an old commit
        let next_free = directory
            .list()?
            .iter()
            .filter_map(|name| SegmentId::from_file_name(name))
            .max()
            .map(|id| id.next());
        if let Some(id) = next_free {
            manifest.next_segment_id = id;
        }
        info!("Created empty index store");
        Ok(Self::with_state(
            directory,
            analyzers,
            manifest,
            Snapshot::empty(),
        ))
    }

    /// Empty store backed by a fresh [`RamDirectory`]
    pub fn in_memory(analyzers: FieldAnalyzers) -> Self {
        Self::with_state(
            Arc::new(RamDirectory::new()),
            analyzers,
            SegmentManifest::new(),
            Snapshot::empty(),
        )
    }

    fn with_state(
        directory: Arc<dyn Directory>,
        analyzers: FieldAnalyzers,
        manifest: SegmentManifest,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            directory,
            analyzers,
            writer: Mutex::new(WriteBuffer::new()),
            manifest: ManifestHolder::new(manifest),
            snapshot: ArcSwap::from_pointee(snapshot),
            closed: AtomicBool::new(false),
        }
    }

    pub fn analyzers(&self) -> &FieldAnalyzers {
        &self.analyzers
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TalkdexError::Closed);
        }
        Ok(())
    }

    /// Buffer a document; it becomes visible at the next commit
    pub fn add_document(&self, doc: Document) -> Result<()> {
        self.ensure_open()?;
        let mut buffer = self.writer.lock();
        buffer.add_document(doc, &self.analyzers)?;
        Ok(())
    }

    /// Buffer a tombstone for a committed document
    pub fn delete_document(&self, id: DocId) -> Result<()> {
        self.ensure_open()?;
        if id.as_u32() >= self.manifest.load().max_doc() {
            return Err(TalkdexError::DocumentNotFound(id));
        }
        self.writer.lock().delete_document(id);
        Ok(())
    }

    /// Number of documents waiting for the next commit
    pub fn pending_docs(&self) -> u32 {
        self.writer.lock().doc_count()
    }

    /// Publish everything buffered since the last commit
    ///
    /// Returns the generation of the resulting commit. On failure the store
    /// keeps its previous commit and the buffer is preserved.
    pub fn commit(&self) -> Result<u64> {
        self.ensure_open()?;
        let mut buffer = self.writer.lock();
        self.commit_locked(&mut buffer)
    }

    /// Add a batch of documents and commit it under one writer lock
    ///
    /// No other add or commit can interleave with the batch, so readers see
    /// all of it or none of it. On any failure the batch is dropped from the
    /// buffer; documents buffered before the call stay pending.
    pub fn add_batch<I>(&self, docs: I) -> Result<u64>
    where
        I: IntoIterator<Item = Document>,
    {
        self.ensure_open()?;
        let mut buffer = self.writer.lock();
        let mark = buffer.doc_count();
        let result = docs
            .into_iter()
            .try_for_each(|doc| buffer.add_document(doc, &self.analyzers).map(|_| ()))
            .and_then(|()| self.commit_locked(&mut buffer));
        if result.is_err() {
            let dropped = buffer.doc_count() - mark;
            buffer.truncate(mark);
            warn!(dropped, "Rolled back failed batch");
        }
        result
    }

    fn commit_locked(&self, buffer: &mut WriteBuffer) -> Result<u64> {
        let current = self.manifest.snapshot();
        if buffer.is_empty() {
            debug!(generation = current.generation, "Nothing to commit");
            return Ok(current.generation);
        }

        let previous = self.snapshot.load_full();
        let mut next = current.clone();
        let mut segments = previous.segments().to_vec();
        let mut written = None;

        if buffer.doc_count() > 0 {
            let id = next.allocate_segment_id();
            let segment = buffer.build_segment(id, next.next_doc_id);
            let bytes = segment.to_bytes()?;
            let file = id.file_name();
            self.directory.write(&file, &bytes)?;
            written = Some(file);
            next.add_segment(id, segment.doc_count(), crc32fast::hash(&bytes));
            segments.push(Arc::new(segment));
        }

        let deleted: RoaringBitmap = previous.deleted() | buffer.deletes();
        next.deleted = deleted.iter().collect();
        next.generation += 1;

        if let Err(e) = self.write_manifest(&next) {
            if let Some(file) = written {
                if let Err(cleanup) = self.directory.delete(&file) {
                    warn!(file = %file, error = %cleanup, "Failed to remove orphaned segment");
                }
            }
            warn!(error = %e, "Commit failed, keeping previous generation");
            return Err(e);
        }

        let max_doc = next.max_doc();
        let generation = next.generation;
        let added = buffer.doc_count();
        let removed = buffer.deletes().len();

        self.snapshot
            .store(Arc::new(Snapshot::new(generation, segments, deleted, max_doc)));
        self.manifest.store(next);
        buffer.clear();

        info!(generation, added, removed, max_doc, "Committed index");
        self.remove_unreferenced_files();
        Ok(generation)
    }

    fn write_manifest(&self, manifest: &SegmentManifest) -> Result<()> {
        let bytes = manifest.to_bincode()?;
        self.directory.write(MANIFEST_TMP_FILE, &bytes)?;
        self.directory.rename(MANIFEST_TMP_FILE, MANIFEST_FILE)?;
        Ok(())
    }

    /// Delete segment files no longer referenced by the live manifest
    fn remove_unreferenced_files(&self) {
        let manifest = self.manifest.load();
        let names = match self.directory.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to list index directory");
                return;
            }
        };
        for name in names {
            if SegmentId::from_file_name(&name).is_some() && !manifest.references(&name) {
                match self.directory.delete(&name) {
                    Ok(()) => debug!(file = %name, "Removed unreferenced segment"),
                    Err(e) => warn!(file = %name, error = %e, "Failed to remove segment"),
                }
            }
        }
    }

    /// Snapshot of the most recent commit
    pub fn open_reader(&self) -> Result<Arc<Snapshot>> {
        self.ensure_open()?;
        Ok(self.snapshot.load_full())
    }

    /// Live documents in the most recent commit
    pub fn num_docs(&self) -> u32 {
        self.snapshot.load().num_docs()
    }

    /// Generation of the most recent commit
    pub fn generation(&self) -> u64 {
        self.manifest.generation()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the store; uncommitted changes are discarded
    ///
    /// Snapshots opened earlier stay readable.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut buffer = self.writer.lock();
        if !buffer.is_empty() {
            warn!(
                pending = buffer.doc_count(),
                "Closing index store with uncommitted changes"
            );
        }
        buffer.clear();
        info!(generation = self.generation(), "Closed index store");
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("directory", &self.directory)
            .field("generation", &self.generation())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, AnalyzerKind, Term};
    use crate::models::FieldOptions;

    fn analyzers() -> FieldAnalyzers {
        FieldAnalyzers::new(Analyzer::of(AnalyzerKind::GermanLight))
    }

    fn title(text: &str) -> Document {
        Document::new().with("title", text, FieldOptions::STORED_INDEXED)
    }

    #[test]
    fn test_commit_publishes_documents() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("Apache Camel")).unwrap();
        store.add_document(title("Apache Karaf")).unwrap();
        assert_eq!(store.num_docs(), 0);
        assert_eq!(store.pending_docs(), 2);

        assert_eq!(store.commit().unwrap(), 1);
        assert_eq!(store.num_docs(), 2);
        assert_eq!(store.pending_docs(), 0);

        let reader = store.open_reader().unwrap();
        assert_eq!(
            reader.doc(DocId(1)).and_then(|d| d.get("title")),
            Some("Apache Karaf")
        );
    }

    #[test]
    fn test_add_batch_commits_in_one_generation() {
        let store = IndexStore::in_memory(analyzers());
        let generation = store
            .add_batch(vec![title("Apache Camel"), title("Apache Karaf")])
            .unwrap();
        assert_eq!(generation, 1);
        assert_eq!(store.num_docs(), 2);
        assert_eq!(store.pending_docs(), 0);
    }

    #[test]
    fn test_add_batch_rolls_back_invalid_document() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("Apache Camel")).unwrap();

        let invalid = Document::new().with("", "x", FieldOptions::STORED_INDEXED);
        let result = store.add_batch(vec![title("Apache Karaf"), invalid]);
        assert!(matches!(result, Err(TalkdexError::InvalidDocument(_))));
        assert_eq!(store.num_docs(), 0);
        assert_eq!(store.pending_docs(), 1);

        store.commit().unwrap();
        let reader = store.open_reader().unwrap();
        assert_eq!(reader.num_docs(), 1);
        assert_eq!(
            reader.doc(DocId(0)).and_then(|d| d.get("title")),
            Some("Apache Camel")
        );
    }

    #[test]
    fn test_uncommitted_invisible() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("Apache Camel")).unwrap();
        store.add_document(title("Apache Karaf")).unwrap();

        let reader = store.open_reader().unwrap();
        assert_eq!(reader.num_docs(), 0);
        assert_eq!(reader.doc_freq("title", &Term::from("apache")), 0);
    }

    #[test]
    fn test_snapshot_isolation() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("Apache Camel")).unwrap();
        store.commit().unwrap();
        let before = store.open_reader().unwrap();

        store.add_document(title("Apache Karaf")).unwrap();
        store.commit().unwrap();

        assert_eq!(before.num_docs(), 1);
        assert_eq!(store.open_reader().unwrap().num_docs(), 2);
    }

    #[test]
    fn test_doc_ids_monotonic_across_commits() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("eins")).unwrap();
        store.commit().unwrap();
        store.delete_document(DocId(0)).unwrap();
        store.add_document(title("zwei")).unwrap();
        store.commit().unwrap();

        let reader = store.open_reader().unwrap();
        assert_eq!(reader.max_doc(), 2);
        assert_eq!(reader.num_docs(), 1);
        assert!(reader.doc(DocId(0)).is_none());
        assert_eq!(reader.doc(DocId(1)).and_then(|d| d.get("title")), Some("zwei"));
    }

    #[test]
    fn test_delete_unknown_document() {
        let store = IndexStore::in_memory(analyzers());
        assert!(matches!(
            store.delete_document(DocId(0)),
            Err(TalkdexError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_empty_commit_keeps_generation() {
        let store = IndexStore::in_memory(analyzers());
        assert_eq!(store.commit().unwrap(), 0);
        store.add_document(title("Apache")).unwrap();
        assert_eq!(store.commit().unwrap(), 1);
        assert_eq!(store.commit().unwrap(), 1);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let store = IndexStore::in_memory(analyzers());
        store.add_document(title("Apache")).unwrap();
        store.commit().unwrap();
        let reader = store.open_reader().unwrap();

        store.close();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(
            store.add_document(title("Karaf")),
            Err(TalkdexError::Closed)
        ));
        assert!(matches!(store.commit(), Err(TalkdexError::Closed)));
        assert!(matches!(store.open_reader(), Err(TalkdexError::Closed)));
        assert_eq!(reader.num_docs(), 1);
    }

    #[test]
    fn test_reopen_from_directory() {
        let dir: Arc<dyn Directory> = Arc::new(RamDirectory::new());
        {
            let store = IndexStore::open(dir.clone(), analyzers()).unwrap();
            store.add_document(title("Apache Camel")).unwrap();
            store.commit().unwrap();
            store.close();
        }

        let store = IndexStore::open(dir.clone(), analyzers()).unwrap();
        assert_eq!(store.num_docs(), 1);
        assert_eq!(store.generation(), 1);

        store.add_document(title("Apache Karaf")).unwrap();
        store.commit().unwrap();
        let reader = Snapshot::open(dir.as_ref()).unwrap();
        assert_eq!(reader.num_docs(), 2);
        assert_eq!(reader.doc_freq("title", &Term::from("apache")), 2);
    }

    #[test]
    fn test_create_discards_previous_commit() {
        let dir: Arc<dyn Directory> = Arc::new(RamDirectory::new());
        let store = IndexStore::open(dir.clone(), analyzers()).unwrap();
        store.add_document(title("alt")).unwrap();
        store.commit().unwrap();
        store.close();

        let store = IndexStore::create(dir.clone(), analyzers()).unwrap();
        assert_eq!(store.num_docs(), 0);
        store.add_document(title("neu")).unwrap();
        store.commit().unwrap();

        let names = dir.list().unwrap();
        assert!(!names.contains(&"segment_0.seg".to_string()));
        assert!(names.contains(&"segment_1.seg".to_string()));

        let reader = Snapshot::open(dir.as_ref()).unwrap();
        assert_eq!(reader.num_docs(), 1);
        assert_eq!(reader.doc(DocId(0)).and_then(|d| d.get("title")), Some("neu"));
    }
}
