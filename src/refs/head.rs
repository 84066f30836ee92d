//! HEAD reference representation.

use crate::objects::Oid;

/// Where HEAD points.
///
/// HEAD either names a branch (normal state, possibly a branch without any
/// commit yet) or holds a commit id directly (detached state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD is `ref: refs/heads/<name>`.
    Branch {
        /// The branch name (without `refs/heads/` prefix).
        name: String,
    },
    /// HEAD holds a commit id.
    Detached {
        /// The commit OID that HEAD points to.
        oid: Oid,
    },
}

impl Head {
    /// Creates a Head pointing to a branch.
    pub fn branch(name: impl Into<String>) -> Self {
        Head::Branch { name: name.into() }
    }

    /// Creates a detached Head.
    pub fn detached(oid: Oid) -> Self {
        Head::Detached { oid }
    }

    /// Returns the branch name if HEAD points to a branch.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Head::Branch { name } => Some(name),
            Head::Detached { .. } => None,
        }
    }

    /// Returns `true` if HEAD is in detached state.
    pub fn is_detached(&self) -> bool {
        matches!(self, Head::Detached { .. })
    }

    /// Returns the text stored in the HEAD file for this state.
    pub fn file_contents(&self) -> String {
        match self {
            Head::Branch { name } => format!("ref: refs/heads/{}\n", name),
            Head::Detached { oid } => oid.to_hex(),
        }
    }
}
