//! Segment manifest for tracking committed segments
//!
//! Commit protocol:
//! 1. Write new segment file
//! 2. Write segments.manifest.tmp
//! 3. Rename to segments.manifest
//!
//! Readers only ever follow `segments.manifest`, so a failure before the
//! rename leaves the previous commit in place.

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::SegmentId;
use crate::error::{Result, TalkdexError};
use crate::models::DocId;

/// Name of the live manifest file
pub const MANIFEST_FILE: &str = "segments.manifest";
/// Name of the manifest written before the atomic rename
pub const MANIFEST_TMP_FILE: &str = "segments.manifest.tmp";

/// Manifest entry for a segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: SegmentId,
    /// First doc id in the segment
    pub base: DocId,
    pub doc_count: u32,
    /// CRC32 of the segment file
    pub checksum: u32,
}

impl ManifestEntry {
    pub fn file_name(&self) -> String {
        self.id.file_name()
    }
}

/// The segment manifest describes one commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentManifest {
    /// Manifest version (for format upgrades)
    pub version: u32,
    /// Generation number (incremented on each commit)
    pub generation: u64,
    /// Next segment ID to allocate
    pub next_segment_id: SegmentId,
    /// Next doc id to assign
    pub next_doc_id: DocId,
    /// Live segments, ascending by base doc id
    pub segments: Vec<ManifestEntry>,
    /// Tombstoned doc ids, ascending
    pub deleted: Vec<u32>,
}

impl SegmentManifest {
    /// Current manifest format version
    pub const VERSION: u32 = 1;

    /// Create a new empty manifest
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            generation: 0,
            next_segment_id: SegmentId::new(0),
            next_doc_id: DocId(0),
            segments: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Allocate a new segment ID
    pub fn allocate_segment_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = id.next();
        id
    }

    /// Append a segment holding `doc_count` docs starting at `next_doc_id`
    pub fn add_segment(&mut self, id: SegmentId, doc_count: u32, checksum: u32) -> ManifestEntry {
        let entry = ManifestEntry {
            id,
            base: self.next_doc_id,
            doc_count,
            checksum,
        };
        self.next_doc_id = DocId(self.next_doc_id.as_u32() + doc_count);
        self.segments.push(entry.clone());
        entry
    }

    /// Highest doc id ever assigned, plus one
    pub fn max_doc(&self) -> u32 {
        self.next_doc_id.as_u32()
    }

    pub fn num_docs(&self) -> u32 {
        self.max_doc() - self.deleted.len() as u32
    }

    /// Get segments count
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Check if manifest is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check whether a file belongs to this commit
    pub fn references(&self, file_name: &str) -> bool {
        self.segments.iter().any(|e| e.file_name() == file_name)
    }

    /// Serialize the manifest to bincode
    pub fn to_bincode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize manifest from bincode
    pub fn from_bincode(data: &[u8]) -> Result<Self> {
        let manifest: Self = bincode::deserialize(data)?;
        if manifest.version != Self::VERSION {
            return Err(TalkdexError::Storage(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported manifest version {}", manifest.version),
            )));
        }
        Ok(manifest)
    }
}

impl Default for SegmentManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe manifest holder with atomic updates
pub struct ManifestHolder {
    inner: arc_swap::ArcSwap<SegmentManifest>,
}

impl ManifestHolder {
    pub fn new(manifest: SegmentManifest) -> Self {
        Self {
            inner: arc_swap::ArcSwap::from_pointee(manifest),
        }
    }

    /// Get the current manifest
    pub fn load(&self) -> arc_swap::Guard<Arc<SegmentManifest>> {
        self.inner.load()
    }

    /// Get a clone of the current manifest
    pub fn snapshot(&self) -> SegmentManifest {
        (**self.inner.load()).clone()
    }

    /// Atomically replace the manifest
    pub fn store(&self, manifest: SegmentManifest) {
        self.inner.store(Arc::new(manifest));
    }

    /// Get generation number
    pub fn generation(&self) -> u64 {
        self.inner.load().generation
    }
}

impl Default for ManifestHolder {
    fn default() -> Self {
        Self::new(SegmentManifest::new())
    }
}
