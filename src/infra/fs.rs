//! Filesystem backend rooted at a repository marker directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::backend::Backend;
use crate::error::{Error, Result};

/// A [`Backend`] that maps relative paths onto a directory on disk.
///
/// Writes replace files in place (no temporary file and rename), so a crash
/// in the middle of a write can leave a truncated file behind.
#[derive(Debug, Clone)]
pub struct FsBackend {
    /// The marker directory (e.g. `<work tree>/.gitty`).
    root: PathBuf,
}

impl FsBackend {
    /// Creates a backend rooted at `root`. The directory does not need to
    /// exist yet.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsBackend {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the marker directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Backend for FsBackend {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let full = self.full(path);
        fs::read(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound(full)
            } else {
                Error::Io(e)
            }
        })
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full = self.full(path);
        if let Some(parent) = full.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&full, data)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.full(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.full(path).is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(self.full(path))?;
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let base = self.full(dir);
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        collect_files(&base, &base, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn collect_files(base: &Path, current: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_file() {
            let relative = path
                .strip_prefix(base)
                .map_err(|_| Error::PathNotFound(path.clone()))?;
            files.push(relative.to_path_buf());
        } else if file_type.is_dir() {
            collect_files(base, &path, files)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());

        backend
            .write(Path::new("objects/ab/cdef"), b"payload")
            .unwrap();

        assert!(backend.is_dir(Path::new("objects/ab")));
        assert!(!backend.is_file(Path::new("objects/ab")));
        assert!(backend.is_file(Path::new("objects/ab/cdef")));
        assert_eq!(
            fs::read(temp.path().join("objects/ab/cdef")).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn test_read_missing_is_path_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());
        let result = backend.read(Path::new("HEAD"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
    }

    #[test]
    fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());
        backend.write(Path::new("HEAD"), b"old").unwrap();
        backend.write(Path::new("HEAD"), b"new").unwrap();
        assert_eq!(backend.read_to_string(Path::new("HEAD")).unwrap(), "new");
    }

    #[test]
    fn test_list_files_sorted_and_nested() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());
        backend.write(Path::new("refs/heads/main"), b"1").unwrap();
        backend.write(Path::new("refs/heads/dev/x"), b"2").unwrap();
        backend.write(Path::new("refs/heads/alpha"), b"3").unwrap();

        let files = backend.list_files(Path::new("refs/heads")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("alpha"),
                PathBuf::from("dev/x"),
                PathBuf::from("main")
            ]
        );
    }

    #[test]
    fn test_list_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        let backend = FsBackend::new(temp.path());
        assert!(backend
            .list_files(Path::new("refs/heads"))
            .unwrap()
            .is_empty());
    }
}
