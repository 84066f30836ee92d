//! SHA-1 digests for objects and the index trailer.

use sha1::{Digest, Sha1};

/// SHA-1 hash size in bytes.
pub const SHA1_SIZE: usize = 20;

/// Computes the SHA-1 hash of the given data.
pub fn sha1(data: &[u8]) -> [u8; SHA1_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    finish(hasher)
}

/// Computes the SHA-1 hash of an object.
///
/// Objects are hashed as: `{type} {size}\0{content}`
///
/// The empty blob hash is `e69de29bb2d1d6434b8b29ae775ad8c2e48c5391`.
pub fn hash_object(object_type: &str, content: &[u8]) -> [u8; SHA1_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {}\0", object_type, content.len()).as_bytes());
    hasher.update(content);
    finish(hasher)
}

fn finish(hasher: Sha1) -> [u8; SHA1_SIZE] {
    let mut out = [0u8; SHA1_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}
