//! Error types for gitty.

use std::fmt;
use std::path::PathBuf;

/// The main error type for gitty operations.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred while reading or writing repository data.
    Io(std::io::Error),

    /// The repository marker directory is missing or incomplete.
    NotARepository(PathBuf),

    /// A repository already exists at the specified path.
    AlreadyARepository(PathBuf),

    /// The requested object was not found.
    ObjectNotFound(String),

    /// The requested reference or branch was not found.
    RefNotFound(String),

    /// The specified path was not found.
    PathNotFound(PathBuf),

    /// The provided string is not a valid object ID.
    InvalidOid(String),

    /// The provided string is not a valid reference name.
    InvalidRefName(String),

    /// A path cannot be placed in a tree.
    InvalidPath {
        /// The offending path.
        path: String,
        /// The reason for rejection.
        reason: String,
    },

    /// The object is invalid or corrupted.
    InvalidObject {
        /// The object ID (empty when unknown).
        oid: String,
        /// The reason for invalidity.
        reason: String,
    },

    /// The index file is malformed.
    InvalidIndex {
        /// The index version (0 if it could not be read).
        version: u32,
        /// The reason for invalidity.
        reason: String,
    },

    /// The index trailer does not match the index contents.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: String,
        /// The checksum computed over the file contents.
        actual: String,
    },

    /// Type mismatch when expecting a specific object type.
    TypeMismatch {
        /// The expected type.
        expected: &'static str,
        /// The actual type.
        actual: &'static str,
    },

    /// Invalid UTF-8 sequence encountered.
    InvalidUtf8,

    /// Zlib decompression failed.
    DecompressionFailed,

    /// The reference already exists.
    RefAlreadyExists(String),

    /// The operation requires HEAD to point at a branch.
    DetachedHead,

    /// Nothing is staged, or the staged tree equals the parent's tree.
    EmptyCommit,

    /// A merge was aborted because both sides changed these paths.
    MergeConflict(Vec<String>),

    /// The configuration file could not be parsed.
    InvalidConfig {
        /// 1-based line number.
        line: usize,
        /// The reason for rejection.
        reason: String,
    },
}

impl Error {
    /// Returns `true` for the "missing object, ref or path" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectNotFound(_) | Error::RefNotFound(_) | Error::PathNotFound(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::NotARepository(path) => {
                write!(f, "not a gitty repository: {}", path.display())
            }
            Error::AlreadyARepository(path) => {
                write!(f, "repository already exists: {}", path.display())
            }
            Error::ObjectNotFound(oid) => write!(f, "object not found: {}", oid),
            Error::RefNotFound(name) => write!(f, "reference not found: {}", name),
            Error::PathNotFound(path) => write!(f, "path not found: {}", path.display()),
            Error::InvalidOid(s) => write!(f, "invalid object id: {}", s),
            Error::InvalidRefName(name) => write!(f, "invalid reference name: {}", name),
            Error::InvalidPath { path, reason } => write!(f, "invalid path {}: {}", path, reason),
            Error::InvalidObject { oid, reason } => {
                write!(f, "invalid object {}: {}", oid, reason)
            }
            Error::InvalidIndex { version, reason } => {
                write!(f, "invalid index (version {}): {}", version, reason)
            }
            Error::ChecksumMismatch { expected, actual } => write!(
                f,
                "index checksum mismatch: stored {}, computed {}",
                expected, actual
            ),
            Error::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {}, got {}", expected, actual)
            }
            Error::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            Error::DecompressionFailed => write!(f, "zlib decompression failed"),
            Error::RefAlreadyExists(name) => write!(f, "reference already exists: {}", name),
            Error::DetachedHead => write!(f, "HEAD is detached"),
            Error::EmptyCommit => write!(f, "nothing to commit"),
            Error::MergeConflict(paths) => {
                write!(f, "merge aborted, conflicting paths: {}", paths.join(", "))
            }
            Error::InvalidConfig { line, reason } => {
                write!(f, "invalid config at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for gitty operations.
pub type Result<T> = std::result::Result<T, Error>;
