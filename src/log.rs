//! Commit history traversal.
//!
//! History is walked along first parents only, newest first, and ends at a
//! root commit. A merge commit's second parent is never visited.

use std::collections::HashSet;

use crate::error::Result;
use crate::objects::{read_commit, Commit, LooseObjectStore, Oid};

/// An iterator over first-parent history.
///
/// Each step loads one commit. A load failure is yielded once as `Err` and
/// ends the iteration. A commit seen twice (only possible with a corrupted
/// store) also ends it.
///
/// # Example
///
/// ```
/// use gitty::{MemoryBackend, Repository, WorkingFile};
///
/// let repo = Repository::with_backend("work", Box::new(MemoryBackend::new())).unwrap();
/// repo.add_paths(&[WorkingFile::new("a.txt", "one")]).unwrap();
/// repo.commit("first").unwrap();
/// repo.add_paths(&[WorkingFile::new("a.txt", "two")]).unwrap();
/// repo.commit("second").unwrap();
///
/// let messages: Vec<String> = repo
///     .log()
///     .unwrap()
///     .map(|c| c.unwrap().message().to_string())
///     .collect();
/// assert_eq!(messages, vec!["second", "first"]);
/// ```
#[derive(Debug)]
pub struct Log<'a> {
    store: LooseObjectStore<'a>,
    next: Option<Oid>,
    visited: HashSet<Oid>,
}

impl<'a> Log<'a> {
    /// Starts a walk at `start`. `None` yields nothing.
    pub fn new(store: LooseObjectStore<'a>, start: Option<Oid>) -> Self {
        Log {
            store,
            next: start,
            visited: HashSet::new(),
        }
    }

    /// Collects the remaining commits, stopping at the first error.
    pub fn collect_commits(self) -> Result<Vec<Commit>> {
        self.collect()
    }
}

impl Iterator for Log<'_> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.next.take()?;
        if !self.visited.insert(oid) {
            tracing::warn!(oid = %oid, "history loops back on itself, stopping");
            return None;
        }

        match read_commit(&self.store, &oid) {
            Ok(commit) => {
                self.next = commit.parent().copied();
                Some(Ok(commit))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::infra::MemoryBackend;
    use crate::objects::{write_commit, write_tree, FlatTree, ObjectType, Signature};

    fn sig() -> Signature {
        Signature::new("Tester", "t@example.com", 1_700_000_000, 0)
    }

    fn commit(store: &LooseObjectStore<'_>, parents: &[Oid], message: &str) -> Oid {
        let tree = write_tree(store, &FlatTree::new()).unwrap();
        write_commit(store, &tree, parents, &sig(), &sig(), message).unwrap()
    }

    #[test]
    fn test_walks_first_parent_to_root() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);
        let root = commit(&store, &[], "root");
        let side = commit(&store, &[root], "side");
        let second = commit(&store, &[root], "second");
        let merge = commit(&store, &[second, side], "merge");

        let messages: Vec<String> = Log::new(store, Some(merge))
            .map(|c| c.unwrap().message().to_string())
            .collect();
        assert_eq!(messages, vec!["merge", "second", "root"]);
    }

    #[test]
    fn test_empty_start() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);
        assert_eq!(Log::new(store, None).count(), 0);
    }

    #[test]
    fn test_missing_parent_yields_error_once() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);
        let ghost = Oid::from_bytes([7; 20]);
        let tip = commit(&store, &[ghost], "orphaned");

        let mut log = Log::new(store, Some(tip));
        assert!(log.next().unwrap().is_ok());
        assert!(matches!(log.next(), Some(Err(Error::ObjectNotFound(_)))));
        assert!(log.next().is_none());
    }

    #[test]
    fn test_non_commit_start_is_type_mismatch() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);
        let blob = store.write(ObjectType::Blob, b"not a commit").unwrap();

        let result = Log::new(store, Some(blob)).collect_commits();
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }
}
