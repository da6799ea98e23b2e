//! Core types for the segment-based index

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::Term;

/// Segment identifier (monotonically increasing per store)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Name of the file holding this segment
    pub fn file_name(&self) -> String {
        format!("{}.seg", self)
    }

    /// Parse a segment id back out of a segment file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_prefix("segment_")?
            .strip_suffix(".seg")?
            .parse()
            .ok()
            .map(Self)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment_{}", self.0)
    }
}

/// Dense document number within a segment (0..doc_count)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Dense document number within the segment
    pub docno: DocNo,
    /// Term frequency in this document's field
    pub term_frequency: u32,
    /// Token positions, ascending
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn with_positions(docno: DocNo, positions: Vec<u32>) -> Self {
        Self {
            docno,
            term_frequency: positions.len() as u32,
            positions,
        }
    }
}

/// Postings of one field, keyed by term and sorted by docno
pub type FieldPostings = BTreeMap<Term, Vec<Posting>>;

/// Position gap inserted between the values of a multi-valued field so
/// phrases never match across value boundaries
pub const POSITION_INCREMENT_GAP: u32 = 100;
