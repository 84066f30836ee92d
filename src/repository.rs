//! The repository handle.
//!
//! [`Repository`] ties a work tree to a storage [`Backend`] holding the
//! marker directory (`.gitty/`) and exposes the high-level operations:
//! staging, committing, branching, diffing and merging.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::diff::{compare, compare_trees, diff_lines, LineChange, TreeDiff};
use crate::error::{Error, Result};
use crate::index::{read_index, write_index, Index, IndexEntry};
use crate::infra::{Backend, FsBackend};
use crate::log::Log;
use crate::merge::{self, MergeOutcome};
use crate::objects::{
    flatten_tree, read_commit, validate_path, write_commit, write_tree, Commit, FlatTree,
    LooseObjectStore, ObjectType, Oid, Signature, OBJECTS_DIR,
};
use crate::refs::{Branch, Head, RefStore, HEADS_DIR, HEAD_FILE};
use crate::status::{compute_status, StatusEntry};
use crate::worktree::{DirScanner, WorkingFile, DEFAULT_IGNORE, IGNORE_FILE, MARKER_DIR};

/// Branch HEAD points to in a fresh repository.
pub const DEFAULT_BRANCH: &str = "main";

/// The result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// The new commit.
    pub oid: Oid,
    /// The branch that moved, or `None` if HEAD was detached.
    pub branch: Option<String>,
    /// True if the commit has no parent.
    pub is_root: bool,
    /// Changes relative to the parent's tree (new side = this commit).
    pub diff: TreeDiff,
}

/// A version-controlled work tree.
///
/// # Example
///
/// ```
/// use gitty::{MemoryBackend, Repository, WorkingFile};
///
/// let repo = Repository::with_backend("work", Box::new(MemoryBackend::new())).unwrap();
/// repo.add_paths(&[
///     WorkingFile::new("a.txt", "hello"),
///     WorkingFile::new("b/c.txt", "world"),
/// ])
/// .unwrap();
/// let outcome = repo.commit("initial").unwrap();
/// assert!(outcome.is_root);
/// assert_eq!(outcome.diff.added(), vec!["a.txt", "b/c.txt"]);
/// ```
#[derive(Debug)]
pub struct Repository {
    /// The root directory of the working tree.
    work_dir: PathBuf,
    /// Storage for everything under the marker directory.
    backend: Box<dyn Backend>,
}

impl Repository {
    /// Creates a repository in `path`.
    ///
    /// Creates `.gitty/` with `objects/`, `refs/heads/` and a HEAD on
    /// `main`, and writes a default `.gittyignore` unless one exists. The
    /// work tree directory is created if needed.
    ///
    /// # Errors
    ///
    /// `Error::AlreadyARepository` if `.gitty/` already exists.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let work_dir = path.as_ref().to_path_buf();
        let marker = work_dir.join(MARKER_DIR);
        if marker.exists() {
            return Err(Error::AlreadyARepository(work_dir));
        }

        fs::create_dir_all(&work_dir)?;
        let repo = Repository {
            work_dir,
            backend: Box::new(FsBackend::new(&marker)),
        };
        repo.create_layout()?;

        let ignore = repo.work_dir.join(IGNORE_FILE);
        if !ignore.exists() {
            fs::write(&ignore, DEFAULT_IGNORE)?;
        }

        tracing::info!(path = %repo.work_dir.display(), "initialized repository");
        Ok(repo)
    }

    /// Opens the repository whose work tree is `path`.
    ///
    /// # Errors
    ///
    /// `Error::NotARepository` unless `path/.gitty` holds a HEAD file, an
    /// `objects/` and a `refs/` directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let work_dir = path.as_ref().to_path_buf();
        let marker = work_dir.join(MARKER_DIR);
        let complete = marker.join(HEAD_FILE).is_file()
            && marker.join(OBJECTS_DIR).is_dir()
            && marker.join("refs").is_dir();
        if !complete {
            return Err(Error::NotARepository(work_dir));
        }

        Ok(Repository {
            work_dir,
            backend: Box::new(FsBackend::new(marker)),
        })
    }

    /// Searches `path` and its ancestors for a repository and opens the
    /// nearest one.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let start = path.as_ref();
        let start = start
            .canonicalize()
            .map_err(|_| Error::NotARepository(start.to_path_buf()))?;

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if dir.join(MARKER_DIR).is_dir() {
                return Self::open(dir);
            }
            current = dir.parent();
        }

        Err(Error::NotARepository(start))
    }

    /// Builds a repository over any backend, creating the marker layout
    /// if HEAD is missing.
    ///
    /// `work_dir` is only used by the scanning helpers.
    pub fn with_backend<P: AsRef<Path>>(work_dir: P, backend: Box<dyn Backend>) -> Result<Self> {
        let repo = Repository {
            work_dir: work_dir.as_ref().to_path_buf(),
            backend,
        };
        if !repo.backend.exists(Path::new(HEAD_FILE)) {
            repo.create_layout()?;
        }
        Ok(repo)
    }

    fn create_layout(&self) -> Result<()> {
        self.backend.create_dir_all(Path::new(OBJECTS_DIR))?;
        self.backend.create_dir_all(Path::new(HEADS_DIR))?;
        self.refs().set_head_branch(DEFAULT_BRANCH)
    }

    /// Returns the work tree root.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the storage backend.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Returns the object store.
    pub fn store(&self) -> LooseObjectStore<'_> {
        LooseObjectStore::new(self.backend.as_ref())
    }

    /// Returns the ref store.
    pub fn refs(&self) -> RefStore<'_> {
        RefStore::new(self.backend.as_ref())
    }

    /// Loads `.gitty/config`; a missing file is an empty configuration.
    pub fn config(&self) -> Result<Config> {
        Config::load(self.backend.as_ref())
    }

    /// Returns where HEAD points.
    pub fn head(&self) -> Result<Head> {
        self.refs().head()
    }

    /// Reads the staging index.
    pub fn index(&self) -> Result<Index> {
        read_index(self.backend.as_ref())
    }

    /// Returns a scanner over the work tree honouring `.gittyignore`.
    pub fn scanner(&self) -> DirScanner {
        DirScanner::new(&self.work_dir)
    }

    /// Stages files: stores each content as a blob and records it in the
    /// index, replacing any entry with the same path.
    ///
    /// All paths are checked before anything is written.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` for a path that cannot be stored in a tree.
    pub fn add_paths(&self, files: &[WorkingFile]) -> Result<()> {
        for file in files {
            validate_path(&file.path)?;
        }

        let store = self.store();
        let mut index = self.index()?;
        for file in files {
            let oid = store.write(ObjectType::Blob, &file.content)?;
            index.upsert(IndexEntry::new(
                file.path.clone(),
                oid,
                file.size(),
                file.mtime_secs,
                file.mtime_nanos,
            ));
        }
        write_index(self.backend.as_ref(), &index)
    }

    /// Scans the work tree and stages every file found.
    pub fn add_all(&self) -> Result<Vec<String>> {
        let files = self.scanner().scan()?;
        self.add_paths(&files)?;
        Ok(files.into_iter().map(|f| f.path).collect())
    }

    /// Removes paths from the index. Returns how many were staged.
    ///
    /// The next commit will not contain them.
    pub fn remove_paths(&self, paths: &[&str]) -> Result<usize> {
        let mut index = self.index()?;
        let removed = paths.iter().filter(|p| index.remove(p)).count();
        if removed > 0 {
            write_index(self.backend.as_ref(), &index)?;
        }
        Ok(removed)
    }

    /// Commits the index with the configured identity.
    ///
    /// See [`Repository::commit_with_signature`].
    pub fn commit(&self, message: &str) -> Result<CommitOutcome> {
        let signature = self.config()?.signature();
        self.commit_with_signature(message, &signature)
    }

    /// Commits the index as `signature` (author and committer).
    ///
    /// The new commit's parent is the commit HEAD resolves to, if any. The
    /// branch HEAD names (or HEAD itself when detached) is moved last.
    ///
    /// # Errors
    ///
    /// `Error::EmptyCommit` if the index is empty or its tree equals the
    /// parent's tree.
    pub fn commit_with_signature(
        &self,
        message: &str,
        signature: &Signature,
    ) -> Result<CommitOutcome> {
        let index = self.index()?;
        if index.is_empty() {
            return Err(Error::EmptyCommit);
        }

        let store = self.store();
        let refs = self.refs();
        let files = index.to_flat_tree();
        let tree = write_tree(&store, &files)?;

        let parent = refs.head_commit()?;
        let diff = match &parent {
            Some(parent) => {
                let parent_tree = *read_commit(&store, parent)?.tree();
                if parent_tree == tree {
                    return Err(Error::EmptyCommit);
                }
                compare_trees(&store, &tree, &parent_tree)?
            }
            None => compare(&files, &FlatTree::new()),
        };

        let parents: Vec<Oid> = parent.into_iter().collect();
        let oid = write_commit(&store, &tree, &parents, signature, signature, message)?;
        refs.advance_head(&oid)?;

        let branch = refs.current_branch()?;
        tracing::info!(
            oid = %oid,
            branch = branch.as_deref().unwrap_or("(detached)"),
            changes = diff.len(),
            "created commit"
        );

        Ok(CommitOutcome {
            oid,
            branch,
            is_root: parents.is_empty(),
            diff,
        })
    }

    /// Lists branches with their tips, marking the current one.
    pub fn branch_tips(&self) -> Result<Vec<Branch>> {
        self.refs().branch_list()
    }

    /// First-parent history from HEAD, newest first. Empty on an unborn
    /// branch.
    pub fn log(&self) -> Result<Log<'_>> {
        Ok(Log::new(self.store(), self.refs().head_commit()?))
    }

    /// First-parent history from `start`.
    pub fn log_from(&self, start: Oid) -> Log<'_> {
        Log::new(self.store(), Some(start))
    }

    /// Loads a commit.
    pub fn commit_object(&self, oid: &Oid) -> Result<Commit> {
        read_commit(&self.store(), oid)
    }

    /// Resolves a branch name or an abbreviated commit id (at least four
    /// hex characters) to a commit id. Branch names take precedence.
    ///
    /// # Errors
    ///
    /// - `Error::RefNotFound` if nothing matches
    /// - `Error::InvalidOid` if a prefix matches several objects
    pub fn resolve(&self, rev: &str) -> Result<Oid> {
        if let Ok(Some(tip)) = self.refs().read_tip(rev) {
            return Ok(tip);
        }

        let matches = match self.store().find_by_prefix(rev) {
            Ok(matches) => matches,
            Err(Error::InvalidOid(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        match matches.as_slice() {
            [oid] => Ok(*oid),
            [] => Err(Error::RefNotFound(rev.to_string())),
            _ => Err(Error::InvalidOid(format!("{} is ambiguous", rev))),
        }
    }

    /// Creates a branch at the current HEAD commit. HEAD does not move.
    pub fn create_branch(&self, name: &str) -> Result<Branch> {
        let oid = self.refs().create_branch(name)?;
        Ok(Branch::new(name, oid, false))
    }

    /// Points HEAD at an existing branch.
    ///
    /// Work tree files and the index are left as they are.
    pub fn switch_to(&self, name: &str) -> Result<()> {
        self.refs().switch_to(name)
    }

    fn tip_tree(&self, branch: Option<&str>) -> Result<Oid> {
        let refs = self.refs();
        let tip = match branch {
            Some(name) => refs.read_tip(name)?,
            None => refs.head_commit()?,
        };
        let tip = tip.ok_or_else(|| {
            Error::RefNotFound(match branch {
                Some(name) => format!("{}/{}", HEADS_DIR, name),
                None => HEAD_FILE.to_string(),
            })
        })?;
        Ok(*read_commit(&self.store(), &tip)?.tree())
    }

    /// Compares the HEAD commit's tree (new side) with `target`'s tree.
    ///
    /// Paths only at HEAD are added, paths only on `target` are deleted.
    pub fn diff_branches(&self, target: &str) -> Result<TreeDiff> {
        let current = self.tip_tree(None)?;
        let other = self.tip_tree(Some(target))?;
        compare_trees(&self.store(), &current, &other)
    }

    /// Compares one file line by line between `target` (old side) and
    /// HEAD (new side). A side without the file counts as empty.
    pub fn diff_file(&self, target: &str, path: &str) -> Result<Vec<LineChange>> {
        let store = self.store();
        let load = |tree: Oid| -> Result<Vec<u8>> {
            match flatten_tree(&store, &tree)?.get(path) {
                Some(blob) => store.read_typed(blob, ObjectType::Blob),
                None => Ok(Vec::new()),
            }
        };

        let old = load(self.tip_tree(Some(target))?)?;
        let new = load(self.tip_tree(None)?)?;
        Ok(diff_lines(&old, &new))
    }

    /// Merges `target` into the current branch as the configured identity.
    ///
    /// See [`merge::merge_branch`] for the rules.
    pub fn merge_branch(&self, target: &str) -> Result<MergeOutcome> {
        let signature = self.config()?.signature();
        merge::merge_branch(&self.store(), &self.refs(), target, &signature)
    }

    /// Compares working files with the index.
    pub fn status(&self, files: &[WorkingFile]) -> Result<Vec<StatusEntry>> {
        Ok(compute_status(&self.index()?, files))
    }

    /// Scans the work tree and compares it with the index.
    pub fn status_worktree(&self) -> Result<Vec<StatusEntry>> {
        let files = self.scanner().scan()?;
        self.status(&files)
    }
}
