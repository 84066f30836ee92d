//! Tree and content comparison.
//!
//! [`compare`] works on flattened trees (path to blob id maps) and reports
//! which paths were added, deleted or modified. There is no rename or copy
//! detection. [`diff_lines`] compares two blob contents line by line.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::objects::{flatten_tree, FlatTree, LooseObjectStore, Oid};

/// The status of a file in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiffStatus {
    /// Present only on the new side.
    Added,
    /// Present only on the old side.
    Deleted,
    /// Present on both sides with different ids.
    Modified,
}

impl DiffStatus {
    /// Returns a single character representing the status.
    pub fn as_char(&self) -> char {
        match self {
            DiffStatus::Added => 'A',
            DiffStatus::Deleted => 'D',
            DiffStatus::Modified => 'M',
        }
    }
}

/// Statistics about a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of added files.
    pub added: usize,
    /// Number of deleted files.
    pub deleted: usize,
    /// Number of modified files.
    pub modified: usize,
}

impl DiffStats {
    /// Returns the total number of changed files.
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.modified
    }
}

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDelta {
    status: DiffStatus,
    path: String,
    old_oid: Option<Oid>,
    new_oid: Option<Oid>,
}

impl DiffDelta {
    /// Returns the status of this delta.
    pub fn status(&self) -> DiffStatus {
        self.status
    }

    /// Returns the file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the blob id on the old side (deleted/modified files).
    pub fn old_oid(&self) -> Option<&Oid> {
        self.old_oid.as_ref()
    }

    /// Returns the blob id on the new side (added/modified files).
    pub fn new_oid(&self) -> Option<&Oid> {
        self.new_oid.as_ref()
    }

    /// Returns a single character representing the status.
    pub fn status_char(&self) -> char {
        self.status.as_char()
    }
}

/// The result of comparing two flattened trees. Deltas are sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    deltas: Vec<DiffDelta>,
}

impl TreeDiff {
    /// Returns the deltas (changes) in this diff.
    pub fn deltas(&self) -> &[DiffDelta] {
        &self.deltas
    }

    /// Returns true if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Returns the number of changed paths.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    fn paths(&self, status: DiffStatus) -> Vec<&str> {
        self.deltas
            .iter()
            .filter(|d| d.status == status)
            .map(|d| d.path.as_str())
            .collect()
    }

    /// Paths only on the new side, sorted.
    pub fn added(&self) -> Vec<&str> {
        self.paths(DiffStatus::Added)
    }

    /// Paths only on the old side, sorted.
    pub fn deleted(&self) -> Vec<&str> {
        self.paths(DiffStatus::Deleted)
    }

    /// Paths on both sides whose ids differ, sorted.
    pub fn modified(&self) -> Vec<&str> {
        self.paths(DiffStatus::Modified)
    }

    /// Computes statistics about this diff.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for delta in &self.deltas {
            match delta.status {
                DiffStatus::Added => stats.added += 1,
                DiffStatus::Deleted => stats.deleted += 1,
                DiffStatus::Modified => stats.modified += 1,
            }
        }
        stats
    }
}

/// Compares two flattened trees.
///
/// `new` is the side whose exclusive paths count as added; paths only in
/// `old` are deleted; paths in both with different ids are modified.
pub fn compare(new: &FlatTree, old: &FlatTree) -> TreeDiff {
    let paths: BTreeSet<&String> = new.keys().chain(old.keys()).collect();

    let mut deltas = Vec::new();
    for path in paths {
        let delta = match (new.get(path), old.get(path)) {
            (Some(n), None) => DiffDelta {
                status: DiffStatus::Added,
                path: path.clone(),
                old_oid: None,
                new_oid: Some(*n),
            },
            (None, Some(o)) => DiffDelta {
                status: DiffStatus::Deleted,
                path: path.clone(),
                old_oid: Some(*o),
                new_oid: None,
            },
            (Some(n), Some(o)) if n != o => DiffDelta {
                status: DiffStatus::Modified,
                path: path.clone(),
                old_oid: Some(*o),
                new_oid: Some(*n),
            },
            _ => continue,
        };
        deltas.push(delta);
    }

    TreeDiff { deltas }
}

/// Loads two stored trees and compares them. See [`compare`].
pub fn compare_trees(store: &LooseObjectStore<'_>, new: &Oid, old: &Oid) -> Result<TreeDiff> {
    if new == old {
        return Ok(TreeDiff::default());
    }
    let new_files = flatten_tree(store, new)?;
    let old_files = flatten_tree(store, old)?;
    Ok(compare(&new_files, &old_files))
}

/// A line that differs between two contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// 1-based line number.
    pub line: usize,
    /// The line on the old side, `None` past its end.
    pub old: Option<String>,
    /// The line on the new side, `None` past its end.
    pub new: Option<String>,
}

/// Compares two contents position by position.
///
/// Line `n` of `old` is compared with line `n` of `new`; no alignment is
/// attempted, so an inserted line reports every following line as changed.
/// Invalid UTF-8 is replaced lossily.
pub fn diff_lines(old: &[u8], new: &[u8]) -> Vec<LineChange> {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    (0..old_lines.len().max(new_lines.len()))
        .filter_map(|i| {
            let o = old_lines.get(i).copied();
            let n = new_lines.get(i).copied();
            (o != n).then(|| LineChange {
                line: i + 1,
                old: o.map(str::to_string),
                new: n.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryBackend;
    use crate::objects::{write_tree, ObjectType};

    fn oid(n: u8) -> Oid {
        Oid::from_bytes([n; 20])
    }

    fn flat(pairs: &[(&str, u8)]) -> FlatTree {
        pairs.iter().map(|(p, n)| (p.to_string(), oid(*n))).collect()
    }

    #[test]
    fn test_compare_identical_is_empty() {
        let tree = flat(&[("a", 1), ("b/c", 2)]);
        let diff = compare(&tree, &tree);
        assert!(diff.is_empty());
        assert_eq!(diff.stats().total(), 0);
    }

    #[test]
    fn test_compare_classifies_paths() {
        let new = flat(&[("keep", 1), ("changed", 2), ("fresh", 3)]);
        let old = flat(&[("keep", 1), ("changed", 9), ("gone", 4)]);

        let diff = compare(&new, &old);
        assert_eq!(diff.added(), vec!["fresh"]);
        assert_eq!(diff.deleted(), vec!["gone"]);
        assert_eq!(diff.modified(), vec!["changed"]);

        let changed = diff.deltas().iter().find(|d| d.path() == "changed").unwrap();
        assert_eq!(changed.old_oid(), Some(&oid(9)));
        assert_eq!(changed.new_oid(), Some(&oid(2)));
        assert_eq!(changed.status_char(), 'M');
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let a = flat(&[("x", 1), ("y", 2), ("only-a", 3)]);
        let b = flat(&[("x", 1), ("y", 5), ("only-b/z", 4)]);

        let ab = compare(&a, &b);
        let ba = compare(&b, &a);
        assert_eq!(ab.added(), ba.deleted());
        assert_eq!(ab.deleted(), ba.added());
        assert_eq!(ab.modified(), ba.modified());
    }

    #[test]
    fn test_compare_output_sorted() {
        let new = flat(&[("z", 1), ("m", 1), ("a", 1)]);
        let diff = compare(&new, &FlatTree::new());
        let paths: Vec<_> = diff.deltas().iter().map(|d| d.path()).collect();
        assert_eq!(paths, vec!["a", "m", "z"]);
        assert_eq!(diff.stats().added, 3);
    }

    #[test]
    fn test_compare_trees_from_store() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);
        let one = store.write(ObjectType::Blob, b"one").unwrap();
        let two = store.write(ObjectType::Blob, b"two").unwrap();

        let mut files = FlatTree::new();
        files.insert("dir/f.txt".to_string(), one);
        let old = write_tree(&store, &files).unwrap();
        files.insert("dir/f.txt".to_string(), two);
        let new = write_tree(&store, &files).unwrap();

        let diff = compare_trees(&store, &new, &old).unwrap();
        assert_eq!(diff.modified(), vec!["dir/f.txt"]);
        assert!(compare_trees(&store, &new, &new).unwrap().is_empty());
    }

    #[test]
    fn test_diff_lines() {
        let changes = diff_lines(b"a\nb\nc\n", b"a\nB\nc\nd\n");
        assert_eq!(
            changes,
            vec![
                LineChange {
                    line: 2,
                    old: Some("b".to_string()),
                    new: Some("B".to_string()),
                },
                LineChange {
                    line: 4,
                    old: None,
                    new: Some("d".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_diff_lines_identical_and_empty() {
        assert!(diff_lines(b"same\n", b"same\n").is_empty());
        let changes = diff_lines(b"gone\n", b"");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new, None);
    }
}
