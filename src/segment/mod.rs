//! Segment-based inverted index with commit snapshots
//!
//! # Architecture
//!
//! - `WriteBuffer`: In-memory buffer for documents added since the last commit
//! - `Segment`: Immutable postings and stored fields produced by one commit
//! - `Snapshot`: Immutable view over the segments of one commit
//! - `SegmentManifest`: Lists the live segments, written atomically per commit
//! - `Directory`: Flat file storage, in memory or on disk
//! - `IndexStore`: Single writer that publishes snapshots

mod buffer;
mod directory;
mod manifest;
mod segment;
mod snapshot;
mod store;
mod types;

pub use buffer::*;
pub use directory::*;
pub use manifest::*;
pub use segment::*;
pub use snapshot::Snapshot;
pub use store::*;
pub use types::*;
