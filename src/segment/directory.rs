//! Storage directories for index files
//!
//! A directory is a flat namespace of named byte files. `RamDirectory` keeps
//! everything in memory, `FsDirectory` maps names onto files under a path.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

/// Flat file namespace backing an index store
pub trait Directory: Send + Sync + fmt::Debug {
    /// Read a whole file
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Create or replace a file, durably
    fn write(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Atomically replace `to` with `from`
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    /// Remove a file
    fn delete(&self, name: &str) -> io::Result<()>;

    fn exists(&self, name: &str) -> bool;

    /// Names of all files, sorted
    fn list(&self) -> io::Result<Vec<String>>;
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", name))
}

/// In-memory directory; clones share the same files
#[derive(Clone, Default)]
pub struct RamDirectory {
    files: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
}

impl RamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes held
    pub fn size_bytes(&self) -> usize {
        self.files.read().values().map(|f| f.len()).sum()
    }
}

impl fmt::Debug for RamDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamDirectory")
            .field("files", &self.files.read().len())
            .finish()
    }
}

impl Directory for RamDirectory {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.files
            .read()
            .get(name)
            .map(|data| data.as_ref().clone())
            .ok_or_else(|| not_found(name))
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        self.files
            .write()
            .insert(name.to_string(), Arc::new(data.to_vec()));
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let mut files = self.files.write();
        let data = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        self.files
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn list(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Directory backed by a filesystem path
#[derive(Clone, Debug)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    /// Open a directory, creating it if needed
    pub fn open<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    #[cfg(unix)]
    fn sync_dir(&self) -> io::Result<()> {
        File::open(&self.root)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Directory for FsDirectory {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.file_path(name))
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(self.file_path(name))?;
        file.write_all(data)?;
        file.sync_all()
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.file_path(from), self.file_path(to))?;
        self.sync_dir()
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.file_path(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
