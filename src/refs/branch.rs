//! Branches and branch-name rules.

use crate::error::{Error, Result};
use crate::objects::Oid;

/// A branch and the commit it points to.
///
/// The branch name does not include the `refs/heads/` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    name: String,
    oid: Oid,
    /// Whether HEAD points to this branch.
    is_current: bool,
}

impl Branch {
    /// Creates a new Branch.
    pub fn new(name: impl Into<String>, oid: Oid, is_current: bool) -> Self {
        Branch {
            name: name.into(),
            oid,
            is_current,
        }
    }

    /// Returns the branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the commit OID the branch points to.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns `true` if this is the current branch.
    pub fn is_current(&self) -> bool {
        self.is_current
    }

    /// Returns the full reference name (with `refs/heads/` prefix).
    pub fn reference_name(&self) -> String {
        format!("refs/heads/{}", self.name)
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.is_current { '*' } else { ' ' };
        write!(f, "{} {} {}", marker, self.name, self.oid.short())
    }
}

/// Checks that a branch name can be stored under `refs/heads/`.
///
/// Names may be nested with `/`. Rejected: empty names or components,
/// components starting with `.`, a leading `-`, `..`, a `.lock` suffix,
/// whitespace, control characters and any of `~^:?*[\`.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = || Error::InvalidRefName(name.to_string());

    if name.is_empty() || name.starts_with('-') || name.ends_with(".lock") || name.contains("..")
    {
        return Err(invalid());
    }

    if name.chars().any(|c| {
        c.is_whitespace() || c.is_control() || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')
    }) {
        return Err(invalid());
    }

    if name
        .split('/')
        .any(|component| component.is_empty() || component.starts_with('.'))
    {
        return Err(invalid());
    }

    Ok(())
}
