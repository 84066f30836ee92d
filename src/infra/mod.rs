//! Infrastructure utilities (hashing, compression, storage backends).

pub mod backend;
pub mod compression;
pub mod fs;
pub mod hash;

pub use backend::{Backend, MemoryBackend};
pub use compression::{compress, decompress};
pub use fs::FsBackend;
pub use hash::hash_object;
