//! Tree objects: encoding of directory snapshots.
//!
//! A tree is a sequence of `<mode> <name>\0<20 raw id bytes>` records. Callers
//! mostly work with the flattened form, a map from `/`-separated file path to
//! blob id; [`write_tree`] and [`flatten_tree`] convert between the two.

use std::collections::{BTreeMap, BTreeSet};

use super::oid::{Oid, OID_BYTES};
use super::store::{LooseObjectStore, ObjectType, RawObject};
use crate::error::{Error, Result};

/// A flattened tree: file path to blob id, ordered by path.
pub type FlatTree = BTreeMap<String, Oid>;

/// File mode for tree entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Regular file: 100644
    Regular,
    /// Subdirectory (tree): 040000
    Directory,
}

impl FileMode {
    /// Parses a file mode from its octal string representation.
    ///
    /// Both the padded and the short spellings are accepted.
    pub fn from_octal(s: &str) -> Option<Self> {
        match s {
            "100644" | "644" => Some(FileMode::Regular),
            "040000" | "40000" => Some(FileMode::Directory),
            _ => None,
        }
    }

    /// Returns the octal string written when encoding.
    pub fn as_octal(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Directory => "040000",
        }
    }

    /// Returns true if this mode represents a file (blob).
    pub fn is_file(&self) -> bool {
        matches!(self, FileMode::Regular)
    }

    /// Returns true if this mode represents a directory (tree).
    pub fn is_directory(&self) -> bool {
        matches!(self, FileMode::Directory)
    }
}

/// An entry in a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: FileMode,
    name: String,
    oid: Oid,
}

impl TreeEntry {
    /// Creates an entry.
    pub fn new(mode: FileMode, name: impl Into<String>, oid: Oid) -> Self {
        TreeEntry {
            mode,
            name: name.into(),
            oid,
        }
    }

    /// Returns the file mode of the entry.
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Returns the name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the object ID of the entry.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns true if this entry represents a file (blob).
    pub fn is_file(&self) -> bool {
        self.mode.is_file()
    }

    /// Returns true if this entry represents a directory (tree).
    pub fn is_directory(&self) -> bool {
        self.mode.is_directory()
    }
}

/// One level of a directory snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Creates a tree from entries, keeping their order.
    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        Tree { entries }
    }

    /// Parses a Tree from a RawObject.
    ///
    /// Entries are kept in stored order, duplicates included.
    ///
    /// # Errors
    ///
    /// `Error::TypeMismatch` for a non-tree object, `Error::InvalidObject`
    /// for an unknown mode or a truncated record.
    pub fn parse(raw: RawObject) -> Result<Self> {
        if raw.object_type != ObjectType::Tree {
            return Err(Error::TypeMismatch {
                expected: "tree",
                actual: raw.object_type.as_str(),
            });
        }

        let invalid = |reason: &str| Error::InvalidObject {
            oid: String::new(),
            reason: reason.to_string(),
        };

        let mut entries = Vec::new();
        let content = &raw.content;
        let mut pos = 0;

        while pos < content.len() {
            let space_pos = content[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| invalid("missing space in tree entry"))?;

            let mode_str = std::str::from_utf8(&content[pos..pos + space_pos])
                .map_err(|_| invalid("invalid UTF-8 in mode"))?;
            let mode = FileMode::from_octal(mode_str).ok_or_else(|| Error::InvalidObject {
                oid: String::new(),
                reason: format!("unknown file mode: {}", mode_str),
            })?;
            pos += space_pos + 1;

            let null_pos = content[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| invalid("missing null byte in tree entry"))?;
            let name = std::str::from_utf8(&content[pos..pos + null_pos])
                .map_err(|_| invalid("invalid UTF-8 in entry name"))?
                .to_string();
            pos += null_pos + 1;

            if pos + OID_BYTES > content.len() {
                return Err(invalid("truncated id in tree entry"));
            }
            let oid = Oid::from_slice(&content[pos..pos + OID_BYTES])?;
            pos += OID_BYTES;

            entries.push(TreeEntry { mode, name, oid });
        }

        Ok(Tree { entries })
    }

    /// Serializes the entries, in their current order.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_octal().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Returns a slice of all entries in the tree.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Returns the number of entries in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first entry with the given name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }
}

/// Checks that a `/`-separated path can be stored in a tree.
///
/// # Errors
///
/// `Error::InvalidPath` for an empty path or an empty, `.`, `..` or
/// NUL-containing component.
pub fn validate_path(path: &str) -> Result<()> {
    match path
        .split('/')
        .find(|c| c.is_empty() || *c == "." || *c == ".." || c.contains('\0'))
    {
        Some(bad) => Err(Error::InvalidPath {
            path: path.to_string(),
            reason: format!("bad path component {:?}", bad),
        }),
        None => Ok(()),
    }
}

/// In-memory grouping of flat paths by directory.
#[derive(Default)]
struct DirNode {
    files: BTreeMap<String, Oid>,
    dirs: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn insert(&mut self, path: &str, oid: Oid) -> Result<()> {
        let reject = |reason: &str| Error::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        validate_path(path)?;
        let components: Vec<&str> = path.split('/').collect();
        let (file_name, parents) = match components.split_last() {
            Some(split) => split,
            None => return Err(reject("empty path")),
        };

        let mut node = self;
        for dir in parents {
            if node.files.contains_key(*dir) {
                return Err(reject(&format!("{} is both a file and a directory", dir)));
            }
            node = node.dirs.entry(dir.to_string()).or_default();
        }

        if node.dirs.contains_key(*file_name) {
            return Err(reject(&format!(
                "{} is both a file and a directory",
                file_name
            )));
        }
        node.files.insert(file_name.to_string(), oid);
        Ok(())
    }

    /// Stores this directory and its subdirectories, children first.
    ///
    /// Files come first in name order, then subdirectories in name order.
    fn write(&self, store: &LooseObjectStore<'_>) -> Result<Oid> {
        let mut entries = Vec::with_capacity(self.files.len() + self.dirs.len());
        for (name, oid) in &self.files {
            entries.push(TreeEntry::new(FileMode::Regular, name.clone(), *oid));
        }
        for (name, child) in &self.dirs {
            let child_oid = child.write(store)?;
            entries.push(TreeEntry::new(FileMode::Directory, name.clone(), child_oid));
        }
        store.write(ObjectType::Tree, &Tree::from_entries(entries).encode())
    }
}

/// Encodes a flat path map as nested tree objects and returns the root id.
///
/// An empty map produces the empty tree.
///
/// # Errors
///
/// `Error::InvalidPath` if a path has an empty, `.` or `..` component, or
/// if a name is used both as a file and as a directory.
pub fn write_tree(store: &LooseObjectStore<'_>, files: &FlatTree) -> Result<Oid> {
    let mut root = DirNode::default();
    for (path, oid) in files {
        root.insert(path, *oid)?;
    }
    root.write(store)
}

/// Reads a tree recursively into its flat path map.
///
/// Directory entries are expanded under `<dir>/`. When a name appears more
/// than once at one level, the first occurrence wins.
pub fn flatten_tree(store: &LooseObjectStore<'_>, oid: &Oid) -> Result<FlatTree> {
    let mut out = FlatTree::new();
    flatten_into(store, oid, "", &mut out)?;
    Ok(out)
}

fn flatten_into(
    store: &LooseObjectStore<'_>,
    oid: &Oid,
    prefix: &str,
    out: &mut FlatTree,
) -> Result<()> {
    let tree = Tree::parse(store.read(oid)?).map_err(|e| match e {
        Error::InvalidObject { reason, .. } => Error::InvalidObject {
            oid: oid.to_hex(),
            reason,
        },
        other => other,
    })?;

    let mut seen = BTreeSet::new();
    for entry in tree.iter() {
        if !seen.insert(entry.name()) {
            continue;
        }
        let path = format!("{}{}", prefix, entry.name());
        match entry.mode() {
            FileMode::Regular => {
                out.insert(path, *entry.oid());
            }
            FileMode::Directory => {
                flatten_into(store, entry.oid(), &format!("{}/", path), out)?;
            }
        }
    }
    Ok(())
}
