//! The staging index.
//!
//! The index file (`.gitty/index`) records the file set of the next commit:
//! path, blob id, size and modification time for every staged file. It is
//! independent of what the working tree currently contains.

mod reader;
mod writer;

use std::path::Path;

use crate::error::{Error, Result};
use crate::infra::Backend;
use crate::objects::{FlatTree, Oid};

pub use reader::parse;
pub use writer::serialize;

/// Name of the index file inside the marker directory.
pub const INDEX_FILE: &str = "index";

/// The only index version this crate reads or writes.
pub const INDEX_VERSION: u32 = 2;

/// The staging index: an ordered list of entries.
///
/// Entry order is insertion order; [`Index::upsert`] keeps an existing
/// entry's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Returns the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a slice of all entries in the index.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Finds an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Adds or replaces an entry.
    ///
    /// An entry with the same path is replaced where it stands; otherwise
    /// the entry is appended.
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Removes an entry from the index by path.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed, `false` if no entry was found.
    pub fn remove(&mut self, path: &str) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.path == path) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Returns the staged file set as a path to blob id map.
    ///
    /// When the same path appears twice (only possible in a hand-edited
    /// file), the later entry wins.
    pub fn to_flat_tree(&self) -> FlatTree {
        self.entries
            .iter()
            .map(|e| (e.path.clone(), e.oid))
            .collect()
    }
}

/// A staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    path: String,
    oid: Oid,
    size: u32,
    mtime_secs: u32,
    mtime_nanos: u32,
}

impl IndexEntry {
    /// Creates a new IndexEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - `/`-separated path relative to the work tree root.
    /// * `oid` - Id of the staged blob.
    /// * `size` - Content length in bytes.
    /// * `mtime_secs` - Modification time, whole seconds since the epoch.
    /// * `mtime_nanos` - Sub-second remainder of the modification time.
    pub fn new(
        path: impl Into<String>,
        oid: Oid,
        size: u32,
        mtime_secs: u32,
        mtime_nanos: u32,
    ) -> Self {
        Self {
            path: path.into(),
            oid,
            size,
            mtime_secs,
            mtime_nanos,
        }
    }

    /// Returns the path of the file relative to the work tree root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the id of the staged blob.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns the file size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the modification time as (seconds, sub-second remainder).
    pub fn mtime(&self) -> (u32, u32) {
        (self.mtime_secs, self.mtime_nanos)
    }
}

/// Reads the index through a backend.
///
/// A missing index file reads as an empty index.
///
/// # Errors
///
/// - `Error::ChecksumMismatch` if the trailer does not match the contents
/// - `Error::InvalidIndex` for a bad signature, version or truncated body
pub fn read_index(backend: &dyn Backend) -> Result<Index> {
    match backend.read(Path::new(INDEX_FILE)) {
        Ok(data) => parse(&data),
        Err(Error::PathNotFound(_)) => Ok(Index::new()),
        Err(e) => Err(e),
    }
}

/// Serializes the index and replaces the index file wholesale.
///
/// Nothing is written when an entry path contains a NUL byte
/// (`Error::InvalidPath`).
pub fn write_index(backend: &dyn Backend, index: &Index) -> Result<()> {
    backend.write(Path::new(INDEX_FILE), &serialize(index)?)?;
    tracing::debug!(entries = index.len(), "wrote index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryBackend;

    fn oid(n: u8) -> Oid {
        Oid::from_bytes([n; 20])
    }

    fn entry(path: &str, n: u8) -> IndexEntry {
        IndexEntry::new(path, oid(n), n as u32, 1_700_000_000, 500)
    }

    #[test]
    fn test_upsert_appends_new_paths() {
        let mut index = Index::new();
        index.upsert(entry("b.txt", 1));
        index.upsert(entry("a.txt", 2));

        let paths: Vec<_> = index.iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut index = Index::new();
        index.upsert(entry("a", 1));
        index.upsert(entry("b", 2));
        index.upsert(entry("c", 3));
        index.upsert(entry("b", 9));

        let paths: Vec<_> = index.iter().map(|e| e.path()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
        assert_eq!(index.get("b").unwrap().oid(), &oid(9));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut index = Index::new();
        index.upsert(entry("a", 1));
        index.upsert(entry("b", 2));

        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.get("a").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_to_flat_tree() {
        let mut index = Index::new();
        index.upsert(entry("z/y.txt", 1));
        index.upsert(entry("a.txt", 2));

        let flat = index.to_flat_tree();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["z/y.txt"], oid(1));
        assert_eq!(flat["a.txt"], oid(2));
    }

    #[test]
    fn test_read_missing_is_empty() {
        let backend = MemoryBackend::new();
        assert!(read_index(&backend).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let backend = MemoryBackend::new();
        let mut index = Index::new();
        index.upsert(entry("src/main.rs", 1));
        index.upsert(entry("README", 2));

        write_index(&backend, &index).unwrap();
        assert_eq!(read_index(&backend).unwrap(), index);
    }

    #[test]
    fn test_read_corrupted_file() {
        let backend = MemoryBackend::new();
        let mut index = Index::new();
        index.upsert(entry("a.txt", 1));
        write_index(&backend, &index).unwrap();

        let mut data = backend.read(Path::new(INDEX_FILE)).unwrap();
        data[20] ^= 0x01;
        backend.write(Path::new(INDEX_FILE), &data).unwrap();

        assert!(matches!(
            read_index(&backend),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_write_rejects_nul_path_and_keeps_file() {
        let backend = MemoryBackend::new();
        let mut index = Index::new();
        index.upsert(entry("a.txt", 1));
        write_index(&backend, &index).unwrap();

        index.upsert(entry("a\0b", 2));
        assert!(matches!(
            write_index(&backend, &index),
            Err(Error::InvalidPath { .. })
        ));

        let on_disk = read_index(&backend).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert!(on_disk.get("a.txt").is_some());
    }
}
