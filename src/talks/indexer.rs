use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::Talk;
use crate::segment::IndexStore;

/// File extension of talk property files
pub const TALK_FILE_EXTENSION: &str = "properties";

/// Writes talks into an index store
///
/// Every call adds and commits its whole batch under the store's writer
/// lock, so a batch becomes visible all at once or not at all, even with
/// several indexers sharing one store. A failed batch leaves nothing
/// behind and can be retried as is.
#[derive(Clone, Debug)]
pub struct Indexer {
    store: Arc<IndexStore>,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Index a batch of talks with a single commit, returning the commit generation
    pub fn index(&self, talks: &[Talk]) -> Result<u64> {
        let start = Instant::now();
        let generation = self.store.add_batch(talks.iter().map(|talk| {
            debug!(path = %talk.path, title = %talk.title, "Indexing talk");
            talk.to_document()
        }))?;
        info!(
            talks = talks.len(),
            generation,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Indexed talks"
        );
        Ok(generation)
    }

    /// Index every `*.properties` file directly inside `dir`
    ///
    /// Files are read in file-name order. Any unreadable or invalid file
    /// aborts the batch before anything is committed.
    pub fn index_directory(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let files = talk_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), "Reading talks");

        let talks = files
            .iter()
            .map(Talk::load)
            .collect::<Result<Vec<_>>>()?;
        self.index(&talks)?;
        Ok(talks.len())
    }
}

/// Property files in `dir`, sorted by file name
pub fn talk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_talk = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == TALK_FILE_EXTENSION);
        if is_talk {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
