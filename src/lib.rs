//! # gitty
//!
//! A minimal content-addressed version-control core.
//!
//! gitty stores file contents, directory snapshots and commits as
//! zlib-compressed objects named by their SHA-1 digest, keeps a checksummed
//! binary staging index, and moves branch pointers on commit, branch,
//! switch and merge. Everything lives in a `.gitty/` directory next to the
//! work tree.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gitty::{Repository, Result};
//!
//! fn main() -> Result<()> {
//!     let repo = Repository::init("path/to/project")?;
//!     repo.add_all()?;
//!     let outcome = repo.commit("initial")?;
//!     println!("committed {}", outcome.oid.short());
//!
//!     repo.create_branch("feature")?;
//!     repo.switch_to("feature")?;
//!     for branch in repo.branch_tips()? {
//!         println!("{}", branch);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`objects`] - Object ids, the loose object store, tree and commit codecs
//! - [`index`] - The staging index file
//! - [`refs`] - HEAD and branches
//! - [`diff`] - Tree comparison and line diffs
//! - [`merge`] - Branch merging with conflict detection
//! - [`log`] - First-parent history
//! - [`status`] - Working files against the index
//! - [`worktree`] - Work tree scanning and ignore rules
//! - [`config`] - `.gitty/config`
//! - [`repository`] - The `Repository` handle tying it all together
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]; install a subscriber to see them.

pub mod config;
pub mod diff;
pub mod error;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod refs;
pub mod repository;
pub mod status;
pub mod worktree;

mod infra;

pub use config::Config;
pub use error::{Error, Result};
pub use repository::{CommitOutcome, Repository};

// Storage backends
pub use infra::{Backend, FsBackend, MemoryBackend};

pub use objects::{Commit, FileMode, Oid, Signature, Tree, TreeEntry};

pub use refs::{Branch, Head};

pub use diff::{DiffStatus, LineChange, TreeDiff};

pub use merge::MergeOutcome;

pub use status::{FileStatus, StatusEntry};

pub use index::{Index, IndexEntry};

pub use worktree::{DirScanner, IgnoreRules, WorkingFile};
