//! Storage backends for the repository marker directory.
//!
//! Every component reaches the on-disk layout (`objects/`, `refs/`, `HEAD`,
//! `index`, `config`) through a [`Backend`], addressed by paths relative to
//! the marker directory. [`FsBackend`](super::fs::FsBackend) is the real
//! implementation; [`MemoryBackend`] keeps everything in memory.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Byte-level access to the files of a repository.
///
/// Implementations perform plain blocking I/O and never retry. Paths are
/// relative to the repository marker directory.
pub trait Backend: fmt::Debug {
    /// Reads a whole file. Missing files yield `Error::PathNotFound`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Creates or truncates a file, creating parent directories as needed.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if a file (not a directory) exists at `path`.
    fn is_file(&self, path: &Path) -> bool {
        self.exists(path) && !self.is_dir(path)
    }

    /// Creates a directory and all of its parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Lists every file below `dir`, recursively, relative to `dir` and
    /// sorted. A missing directory lists as empty.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Reads a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String> {
        String::from_utf8(self.read(path)?).map_err(|_| Error::InvalidUtf8)
    }
}

/// An in-memory backend.
///
/// Used for tests and for callers that want a throwaway repository. Not
/// shareable across threads.
#[derive(Default)]
pub struct MemoryBackend {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of files currently held.
    pub fn file_count(&self) -> usize {
        self.files.borrow().len()
    }

    fn add_ancestors(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("files", &self.files.borrow().len())
            .field("dirs", &self.dirs.borrow().len())
            .finish()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::PathNotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.add_ancestors(path);
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || self.dirs.borrow().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_ancestors(&path.join("_"));
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        // BTreeMap keys are already sorted
        Ok(self
            .files
            .borrow()
            .keys()
            .filter_map(|p| p.strip_prefix(dir).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let backend = MemoryBackend::new();
        backend.write(Path::new("refs/heads/main"), b"abc").unwrap();

        assert_eq!(backend.read(Path::new("refs/heads/main")).unwrap(), b"abc");
        assert!(backend.exists(Path::new("refs/heads/main")));
        assert!(backend.is_file(Path::new("refs/heads/main")));
        assert!(backend.is_dir(Path::new("refs/heads")));
        assert!(backend.exists(Path::new("refs/heads")));
        assert!(!backend.is_file(Path::new("refs/heads")));
        assert!(backend.is_dir(Path::new("refs")));
        assert_eq!(backend.file_count(), 1);
    }

    #[test]
    fn test_memory_read_missing() {
        let backend = MemoryBackend::new();
        let result = backend.read(Path::new("HEAD"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
    }

    #[test]
    fn test_memory_overwrite() {
        let backend = MemoryBackend::new();
        backend.write(Path::new("index"), b"one").unwrap();
        backend.write(Path::new("index"), b"two").unwrap();
        assert_eq!(backend.read_to_string(Path::new("index")).unwrap(), "two");
    }

    #[test]
    fn test_memory_create_dir_all() {
        let backend = MemoryBackend::new();
        backend.create_dir_all(Path::new("objects")).unwrap();
        backend.create_dir_all(Path::new("refs/heads")).unwrap();

        assert!(backend.is_dir(Path::new("objects")));
        assert!(backend.is_dir(Path::new("refs/heads")));
        assert!(!backend.exists(Path::new("refs/tags")));
        assert_eq!(backend.file_count(), 0);
    }

    #[test]
    fn test_memory_list_files_nested() {
        let backend = MemoryBackend::new();
        backend.write(Path::new("refs/heads/main"), b"1").unwrap();
        backend.write(Path::new("refs/heads/feature/x"), b"2").unwrap();
        backend.write(Path::new("HEAD"), b"3").unwrap();

        let files = backend.list_files(Path::new("refs/heads")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("feature/x"), PathBuf::from("main")]
        );

        assert!(backend
            .list_files(Path::new("refs/tags"))
            .unwrap()
            .is_empty());
    }
}
