//! Branch merging with conservative conflict detection.
//!
//! A merge runs through fixed stages:
//!
//! 1. **Resolve** both branch tips and their trees ([`MergePlan::resolve`]).
//! 2. **Detect conflicts**: every path present in both trees with different
//!    blob ids is a conflict ([`MergePlan::conflicts`]). Any conflict ends
//!    the merge with `Error::MergeConflict` and nothing is written.
//! 3. **Create the commit**: parents are the current tip then the target
//!    tip, the tree is the current branch's tree ([`MergePlan::write_commit`]).
//! 4. **Advance** the current branch to the new commit.
//!
//! The current branch only moves in the last stage, so a failure anywhere
//! earlier leaves every ref untouched. Paths that exist only on the target
//! side are not brought into the merged tree.

use crate::diff::{compare, TreeDiff};
use crate::error::{Error, Result};
use crate::objects::{
    flatten_tree, read_commit, write_commit, FlatTree, LooseObjectStore, Oid, Signature,
};
use crate::refs::{RefStore, HEADS_DIR};

/// Both sides of a merge, resolved and loaded.
#[derive(Debug, Clone)]
pub struct MergePlan {
    current_branch: String,
    target_branch: String,
    current_tip: Oid,
    target_tip: Oid,
    tree: Oid,
    current_files: FlatTree,
    target_files: FlatTree,
}

impl MergePlan {
    /// Resolves the current branch and `target` to commits and loads their
    /// trees.
    ///
    /// # Errors
    ///
    /// - `Error::DetachedHead` if HEAD is not on a branch
    /// - `Error::RefNotFound` if either branch has no commit
    pub fn resolve(store: &LooseObjectStore<'_>, refs: &RefStore<'_>, target: &str) -> Result<Self> {
        let current_branch = refs.current_branch()?.ok_or(Error::DetachedHead)?;
        let current_tip = refs
            .read_tip(&current_branch)?
            .ok_or_else(|| Error::RefNotFound(format!("{}/{}", HEADS_DIR, current_branch)))?;
        let target_tip = refs
            .read_tip(target)?
            .ok_or_else(|| Error::RefNotFound(format!("{}/{}", HEADS_DIR, target)))?;

        let current_commit = read_commit(store, &current_tip)?;
        let target_commit = read_commit(store, &target_tip)?;
        let current_files = flatten_tree(store, current_commit.tree())?;
        let target_files = flatten_tree(store, target_commit.tree())?;

        Ok(MergePlan {
            current_branch,
            target_branch: target.to_string(),
            current_tip,
            target_tip,
            tree: *current_commit.tree(),
            current_files,
            target_files,
        })
    }

    /// Returns the branch being merged into.
    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    /// Returns the branch being merged.
    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }

    /// Returns `[current tip, target tip]`, the parents of the merge commit.
    pub fn parents(&self) -> [Oid; 2] {
        [self.current_tip, self.target_tip]
    }

    /// Returns the tree the merge commit will carry.
    pub fn tree(&self) -> &Oid {
        &self.tree
    }

    /// Compares the current tree (new side) with the target tree.
    pub fn diff(&self) -> TreeDiff {
        compare(&self.current_files, &self.target_files)
    }

    /// Returns the conflicting paths, sorted.
    pub fn conflicts(&self) -> Vec<String> {
        self.diff().modified().into_iter().map(str::to_string).collect()
    }

    /// Returns the merge commit message.
    pub fn message(&self) -> String {
        format!(
            "Merge branch '{}' into {}",
            self.target_branch, self.current_branch
        )
    }

    /// Stores the merge commit. No ref is touched.
    pub fn write_commit(&self, store: &LooseObjectStore<'_>, signature: &Signature) -> Result<Oid> {
        write_commit(
            store,
            &self.tree,
            &self.parents(),
            signature,
            signature,
            &self.message(),
        )
    }
}

/// A completed merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merge commit.
    pub oid: Oid,
    /// The branch that was advanced.
    pub branch: String,
    /// The merge commit's parents, current tip first.
    pub parents: [Oid; 2],
}

/// Merges `target` into the current branch.
///
/// # Errors
///
/// `Error::MergeConflict` with the sorted conflicting paths when both trees
/// hold a path with different content; see [`MergePlan::resolve`] for
/// resolution errors.
pub fn merge_branch(
    store: &LooseObjectStore<'_>,
    refs: &RefStore<'_>,
    target: &str,
    signature: &Signature,
) -> Result<MergeOutcome> {
    let plan = MergePlan::resolve(store, refs, target)?;

    let conflicts = plan.conflicts();
    if !conflicts.is_empty() {
        tracing::warn!(
            from = plan.target_branch(),
            into = plan.current_branch(),
            paths = ?conflicts,
            "merge aborted on conflicts"
        );
        return Err(Error::MergeConflict(conflicts));
    }

    let oid = plan.write_commit(store, signature)?;
    refs.write_tip(plan.current_branch(), &oid)?;
    tracing::info!(
        oid = %oid,
        from = plan.target_branch(),
        into = plan.current_branch(),
        "created merge commit"
    );

    Ok(MergeOutcome {
        oid,
        branch: plan.current_branch,
        parents: [plan.current_tip, plan.target_tip],
    })
}
