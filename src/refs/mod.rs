//! References: HEAD and branches.

pub mod branch;
pub mod head;
pub mod resolver;

pub use branch::{validate_branch_name, Branch};
pub use head::Head;
pub use resolver::{RefStore, RefValue, HEADS_DIR, HEAD_FILE};
