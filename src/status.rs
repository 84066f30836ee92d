//! Working tree status against the staging index.
//!
//! The working tree is given as the list of [`WorkingFile`]s a scanner
//! produced; nothing here touches the filesystem.

use std::collections::BTreeMap;
use std::fmt;

use crate::index::Index;
use crate::objects::{ObjectType, Oid};
use crate::worktree::WorkingFile;

/// How a path differs between the working tree and the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileStatus {
    /// In the working tree, not in the index.
    Untracked,
    /// In both, with different content.
    Modified,
    /// In the index, missing from the working tree.
    Deleted,
}

impl FileStatus {
    /// Returns a single character representing the status.
    pub fn as_char(&self) -> char {
        match self {
            FileStatus::Untracked => '?',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
        }
    }
}

/// A path and its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    path: String,
    status: FileStatus,
}

impl StatusEntry {
    /// Creates a new StatusEntry.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        StatusEntry {
            path: path.into(),
            status,
        }
    }

    /// Returns the `/`-separated path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the status.
    pub fn status(&self) -> FileStatus {
        self.status
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_char(), self.path)
    }
}

/// Compares working files with the index.
///
/// Content is compared by blob id, so touching a file without changing it
/// is not a modification. Unchanged paths are omitted. The result is
/// sorted by path.
pub fn compute_status(index: &Index, files: &[WorkingFile]) -> Vec<StatusEntry> {
    let working: BTreeMap<&str, &WorkingFile> =
        files.iter().map(|f| (f.path.as_str(), f)).collect();

    let mut entries: Vec<StatusEntry> = Vec::new();
    for (path, file) in &working {
        let status = match index.get(path) {
            None => FileStatus::Untracked,
            Some(staged) => {
                let current = Oid::hash_object(ObjectType::Blob.as_str(), &file.content);
                if &current == staged.oid() {
                    continue;
                }
                FileStatus::Modified
            }
        };
        entries.push(StatusEntry::new(*path, status));
    }

    entries.extend(
        index
            .iter()
            .filter(|e| !working.contains_key(e.path()))
            .map(|e| StatusEntry::new(e.path(), FileStatus::Deleted)),
    );

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    fn staged(path: &str, content: &[u8]) -> IndexEntry {
        let oid = Oid::hash_object("blob", content);
        IndexEntry::new(path, oid, content.len() as u32, 0, 0)
    }

    #[test]
    fn test_clean_tree_reports_nothing() {
        let mut index = Index::new();
        index.upsert(staged("a.txt", b"hello"));
        let files = vec![WorkingFile::new("a.txt", "hello").with_mtime(99, 1)];

        assert!(compute_status(&index, &files).is_empty());
    }

    #[test]
    fn test_all_statuses_sorted() {
        let mut index = Index::new();
        index.upsert(staged("z/kept.txt", b"same"));
        index.upsert(staged("changed.txt", b"old"));
        index.upsert(staged("b/gone.txt", b"bye"));

        let files = vec![
            WorkingFile::new("z/kept.txt", "same"),
            WorkingFile::new("new.txt", "fresh"),
            WorkingFile::new("changed.txt", "new"),
        ];

        let status = compute_status(&index, &files);
        let rendered: Vec<String> = status.iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered, vec!["D b/gone.txt", "M changed.txt", "? new.txt"]);
    }

    #[test]
    fn test_empty_index_everything_untracked() {
        let files = vec![WorkingFile::new("b", ""), WorkingFile::new("a", "")];
        let status = compute_status(&Index::new(), &files);
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].path(), "a");
        assert!(status.iter().all(|e| e.status() == FileStatus::Untracked));
    }
}
