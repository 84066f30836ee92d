//! Working-tree enumeration.
//!
//! The repository core only consumes [`WorkingFile`] values. [`DirScanner`]
//! produces them from a directory on disk, honouring the `.gittyignore`
//! file at the work tree root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::{Error, Result};

/// Name of the repository marker directory, never scanned.
pub const MARKER_DIR: &str = ".gitty";

/// Name of the ignore file at the work tree root.
pub const IGNORE_FILE: &str = ".gittyignore";

/// Ignore file written by `init` when none exists.
pub const DEFAULT_IGNORE: &str = "\
# editor and tool state
.idea/
.vscode/
.iml
# build output
target/
";

/// A file from the working tree, ready to be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingFile {
    /// `/`-separated path relative to the work tree root.
    pub path: String,
    /// The file content.
    pub content: Vec<u8>,
    /// Modification time, whole seconds since the epoch.
    pub mtime_secs: u32,
    /// Sub-second remainder of the modification time, in nanoseconds.
    pub mtime_nanos: u32,
}

impl WorkingFile {
    /// Creates a working file with a zero modification time.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        WorkingFile {
            path: path.into(),
            content: content.into(),
            mtime_secs: 0,
            mtime_nanos: 0,
        }
    }

    /// Sets the modification time.
    pub fn with_mtime(mut self, secs: u32, nanos: u32) -> Self {
        self.mtime_secs = secs;
        self.mtime_nanos = nanos;
        self
    }

    /// Returns the content length, saturated to `u32`.
    pub fn size(&self) -> u32 {
        u32::try_from(self.content.len()).unwrap_or(u32::MAX)
    }
}

/// Ignore patterns.
///
/// One pattern per line; blank lines and lines starting with `#` are
/// skipped. A path is ignored when any pattern occurs as a substring of its
/// `/`-separated relative path (directories are tested with a trailing `/`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    patterns: Vec<String>,
}

impl IgnoreRules {
    /// Parses ignore rules from file content.
    pub fn parse(content: &str) -> Self {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        IgnoreRules { patterns }
    }

    /// Loads `.gittyignore` from the work tree root.
    ///
    /// A missing file yields no rules. An unreadable file is logged and
    /// treated as empty.
    pub fn load(root: &Path) -> Self {
        let path = root.join(IGNORE_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read ignore file");
                Self::default()
            }
        }
    }

    /// Returns the patterns in file order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the relative path matches any pattern.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| rel_path.contains(p.as_str()))
    }
}

/// Walks a work tree and loads its files.
#[derive(Debug, Clone)]
pub struct DirScanner {
    root: PathBuf,
    rules: IgnoreRules,
}

impl DirScanner {
    /// Creates a scanner for `root`, loading its ignore file.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let rules = IgnoreRules::load(&root);
        DirScanner { root, rules }
    }

    /// Creates a scanner with explicit rules.
    pub fn with_rules<P: AsRef<Path>>(root: P, rules: IgnoreRules) -> Self {
        DirScanner {
            root: root.as_ref().to_path_buf(),
            rules,
        }
    }

    /// Returns the work tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the active ignore rules.
    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Lists the relative paths of all non-ignored files, sorted.
    ///
    /// The marker directory is always skipped. Symlinks and other special
    /// files are skipped.
    pub fn list_paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        self.walk(&self.root, "", &mut paths)?;
        paths.sort();
        Ok(paths)
    }

    /// Loads every non-ignored file, sorted by path.
    pub fn scan(&self) -> Result<Vec<WorkingFile>> {
        self.list_paths()?
            .iter()
            .map(|p| self.read_file(p))
            .collect()
    }

    /// Loads one file given its `/`-separated relative path.
    ///
    /// # Errors
    ///
    /// `Error::PathNotFound` if the file does not exist.
    pub fn read_file(&self, rel_path: &str) -> Result<WorkingFile> {
        let full = self.root.join(rel_path);
        let not_found = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound(full.clone())
            } else {
                Error::Io(e)
            }
        };

        let content = fs::read(&full).map_err(not_found)?;
        let metadata = fs::metadata(&full).map_err(not_found)?;
        let (secs, nanos) = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| (d.as_secs() as u32, d.subsec_nanos()))
            .unwrap_or((0, 0));

        Ok(WorkingFile::new(rel_path, content).with_mtime(secs, nanos))
    }

    fn walk(&self, dir: &Path, prefix: &str, paths: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound(dir.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if prefix.is_empty() && name == MARKER_DIR {
                continue;
            }

            let rel = format!("{}{}", prefix, name);
            let file_type = entry.file_type()?;

            if file_type.is_file() {
                if !self.rules.is_ignored(&rel) {
                    paths.push(rel);
                }
            } else if file_type.is_dir() {
                let dir_rel = format!("{}/", rel);
                if !self.rules.is_ignored(&dir_rel) {
                    self.walk(&entry.path(), &dir_rel, paths)?;
                }
            }
        }

        Ok(())
    }
}
