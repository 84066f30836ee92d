//! Reading and moving HEAD and branch pointers.

use std::path::{Path, PathBuf};

use super::branch::{validate_branch_name, Branch};
use super::head::Head;
use crate::error::{Error, Result};
use crate::infra::Backend;
use crate::objects::Oid;

/// Name of the HEAD file inside the marker directory.
pub const HEAD_FILE: &str = "HEAD";

/// Directory holding one file per branch.
pub const HEADS_DIR: &str = "refs/heads";

/// The content of a ref file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// A commit id.
    Direct(Oid),
    /// A pointer to another ref (e.g., HEAD -> refs/heads/main).
    Symbolic(String),
}

/// Access to HEAD and `refs/heads/*` through a [`Backend`].
///
/// Branch files hold 40 hex characters and are written without a trailing
/// newline; surrounding whitespace is trimmed when reading. No locking is
/// performed: with two concurrent writers the last one wins.
#[derive(Debug, Clone, Copy)]
pub struct RefStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> RefStore<'a> {
    /// Creates a RefStore over the given backend.
    pub fn new(backend: &'a dyn Backend) -> Self {
        RefStore { backend }
    }

    fn branch_path(name: &str) -> PathBuf {
        Path::new(HEADS_DIR).join(name)
    }

    /// Fails when `name` cannot be stored as a branch file: either a
    /// directory of branches sits at its path, or one of its leading
    /// components is already a branch (`main` blocks `main/x`).
    fn check_branch_slot(&self, name: &str) -> Result<()> {
        if self.backend.is_dir(&Self::branch_path(name)) {
            return Err(Error::InvalidRefName(format!(
                "{} is a directory of branches",
                name
            )));
        }
        let components: Vec<&str> = name.split('/').collect();
        for depth in 1..components.len() {
            let parent = components[..depth].join("/");
            if self.backend.is_file(&Self::branch_path(&parent)) {
                return Err(Error::InvalidRefName(format!(
                    "{} conflicts with existing branch {}",
                    name, parent
                )));
            }
        }
        Ok(())
    }

    /// Reads and parses a ref file.
    ///
    /// # Arguments
    ///
    /// * `name` - The file name relative to the marker directory (e.g.
    ///   "HEAD" or "refs/heads/main").
    pub fn read_ref_file(&self, name: &str) -> Result<RefValue> {
        let content = self
            .backend
            .read_to_string(Path::new(name))
            .map_err(|e| match e {
                Error::PathNotFound(_) => Error::RefNotFound(name.to_string()),
                other => other,
            })?;
        let content = content.trim();

        if let Some(target) = content.strip_prefix("ref:") {
            Ok(RefValue::Symbolic(target.trim().to_string()))
        } else {
            Ok(RefValue::Direct(Oid::from_hex(content)?))
        }
    }

    /// Returns where HEAD points.
    ///
    /// # Errors
    ///
    /// `Error::RefNotFound` if there is no HEAD file, and
    /// `Error::InvalidRefName` if HEAD names something outside
    /// `refs/heads/`.
    pub fn head(&self) -> Result<Head> {
        match self.read_ref_file(HEAD_FILE)? {
            RefValue::Symbolic(target) => match target.strip_prefix("refs/heads/") {
                Some(branch) => Ok(Head::branch(branch)),
                None => Err(Error::InvalidRefName(target)),
            },
            RefValue::Direct(oid) => Ok(Head::detached(oid)),
        }
    }

    /// Returns the current branch name, or `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.head()?.branch_name().map(str::to_string))
    }

    /// Returns the commit HEAD resolves to, or `None` when HEAD names a
    /// branch without commits.
    pub fn head_commit(&self) -> Result<Option<Oid>> {
        match self.head()? {
            Head::Branch { name } => self.read_tip(&name),
            Head::Detached { oid } => Ok(Some(oid)),
        }
    }

    /// Reads the commit a branch points to. A missing branch file is `None`.
    ///
    /// # Errors
    ///
    /// `Error::RefNotFound` if `branch` names a directory of branches
    /// (`feature` when only `feature/x` exists).
    pub fn read_tip(&self, branch: &str) -> Result<Option<Oid>> {
        if self.backend.is_dir(&Self::branch_path(branch)) {
            return Err(Error::RefNotFound(format!("{}/{}", HEADS_DIR, branch)));
        }
        match self.read_ref_file(&format!("{}/{}", HEADS_DIR, branch)) {
            Ok(RefValue::Direct(oid)) => Ok(Some(oid)),
            Ok(RefValue::Symbolic(target)) => Err(Error::InvalidRefName(format!(
                "{} is a symbolic ref to {}",
                branch, target
            ))),
            Err(Error::RefNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Points a branch at a commit, creating the branch file if needed.
    pub fn write_tip(&self, branch: &str, oid: &Oid) -> Result<()> {
        validate_branch_name(branch)?;
        self.check_branch_slot(branch)?;
        self.backend
            .write(&Self::branch_path(branch), oid.to_hex().as_bytes())?;
        tracing::info!(branch, oid = %oid, "updated branch");
        Ok(())
    }

    /// Points HEAD at a branch. The branch does not need to exist.
    pub fn set_head_branch(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let head = Head::branch(branch);
        self.backend
            .write(Path::new(HEAD_FILE), head.file_contents().as_bytes())
    }

    /// Moves whatever HEAD designates to `oid`: the current branch's tip,
    /// or HEAD itself when detached.
    pub fn advance_head(&self, oid: &Oid) -> Result<()> {
        match self.head()? {
            Head::Branch { name } => self.write_tip(&name, oid),
            Head::Detached { .. } => self.detach(oid),
        }
    }

    /// Creates a branch at the commit HEAD currently resolves to.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidRefName` for a malformed name
    /// - `Error::RefAlreadyExists` if the branch file exists
    /// - `Error::InvalidRefName` if the name collides with a directory of
    ///   branches or with an existing branch used as a directory
    /// - `Error::RefNotFound` if HEAD has no commit yet
    pub fn create_branch(&self, name: &str) -> Result<Oid> {
        validate_branch_name(name)?;
        if self.backend.is_file(&Self::branch_path(name)) {
            return Err(Error::RefAlreadyExists(name.to_string()));
        }
        self.check_branch_slot(name)?;

        let tip = self
            .head_commit()?
            .ok_or_else(|| Error::RefNotFound(HEAD_FILE.to_string()))?;
        self.write_tip(name, &tip)?;
        Ok(tip)
    }

    /// Repoints HEAD at an existing branch.
    ///
    /// Only HEAD changes; no working-tree files are touched.
    ///
    /// # Errors
    ///
    /// `Error::RefNotFound` if the branch file does not exist. A directory
    /// of nested branches is not a branch.
    pub fn switch_to(&self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        if !self.backend.is_file(&Self::branch_path(name)) {
            return Err(Error::RefNotFound(format!("{}/{}", HEADS_DIR, name)));
        }
        self.set_head_branch(name)?;
        tracing::info!(branch = name, "switched HEAD");
        Ok(())
    }

    /// Writes a commit id directly into HEAD.
    pub fn detach(&self, oid: &Oid) -> Result<()> {
        self.backend.write(
            Path::new(HEAD_FILE),
            Head::detached(*oid).file_contents().as_bytes(),
        )?;
        tracing::info!(oid = %oid, "detached HEAD");
        Ok(())
    }

    /// Lists branch names (without the `refs/heads/` prefix), sorted.
    pub fn branches(&self) -> Result<Vec<String>> {
        let files = self.backend.list_files(Path::new(HEADS_DIR))?;
        Ok(files
            .iter()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect())
    }

    /// Lists branches with their tips, marking the one HEAD points to.
    pub fn branch_list(&self) -> Result<Vec<Branch>> {
        let current = self.current_branch()?;
        let mut list = Vec::new();
        for name in self.branches()? {
            if let Some(oid) = self.read_tip(&name)? {
                let is_current = current.as_deref() == Some(name.as_str());
                list.push(Branch::new(name, oid, is_current));
            }
        }
        Ok(list)
    }
}
