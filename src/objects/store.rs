//! Loose object store over a repository [`Backend`].

use std::path::{Path, PathBuf};

use super::oid::{Oid, OID_HEX_LEN};
use crate::error::{Error, Result};
use crate::infra::{compress, decompress, Backend};

/// Directory under the marker directory that holds the objects.
pub const OBJECTS_DIR: &str = "objects";

/// The kind of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// File content.
    Blob,
    /// A directory snapshot.
    Tree,
    /// Snapshot metadata.
    Commit,
}

impl ObjectType {
    /// Returns the kind name as written in object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Parses a kind name from an object header.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(ObjectType::Blob),
            "tree" => Some(ObjectType::Tree),
            "commit" => Some(ObjectType::Commit),
            _ => None,
        }
    }
}

/// A decoded object: its kind and payload (header stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// The kind of the object.
    pub object_type: ObjectType,
    /// The payload.
    pub content: Vec<u8>,
}

/// Content-addressed storage of zlib-compressed objects.
///
/// Objects live at `objects/<first 2 hex>/<remaining 38 hex>`. Stored
/// objects are never rewritten or deleted.
#[derive(Debug, Clone, Copy)]
pub struct LooseObjectStore<'a> {
    backend: &'a dyn Backend,
}

impl<'a> LooseObjectStore<'a> {
    /// Creates a store over the given backend.
    pub fn new(backend: &'a dyn Backend) -> Self {
        LooseObjectStore { backend }
    }

    /// Converts an Oid to the backend path of its object file.
    ///
    /// For example, `da39a3ee5e6b4b0d3255bfef95601890afd80709` becomes
    /// `objects/da/39a3ee5e6b4b0d3255bfef95601890afd80709`.
    pub fn oid_to_path(oid: &Oid) -> PathBuf {
        let hex = oid.to_hex();
        Path::new(OBJECTS_DIR).join(&hex[..2]).join(&hex[2..])
    }

    /// Stores an object and returns its id.
    ///
    /// The object is framed as `<kind> <len>\0<payload>`, hashed, compressed
    /// and written. If a file for the id already exists it is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` (or whatever the backend reports) if the write
    /// fails.
    pub fn write(&self, object_type: ObjectType, content: &[u8]) -> Result<Oid> {
        let oid = Oid::hash_object(object_type.as_str(), content);
        let path = Self::oid_to_path(&oid);
        if self.backend.exists(&path) {
            tracing::trace!(oid = %oid, "object already stored");
            return Ok(oid);
        }

        let header = format!("{} {}\0", object_type.as_str(), content.len());
        let mut raw = header.into_bytes();
        raw.extend_from_slice(content);

        self.backend.write(&path, &compress(&raw))?;
        tracing::debug!(
            oid = %oid,
            kind = object_type.as_str(),
            size = content.len(),
            "stored object"
        );
        Ok(oid)
    }

    /// Reads and decodes an object.
    ///
    /// # Errors
    ///
    /// - `Error::ObjectNotFound` if no file exists for the id
    /// - `Error::DecompressionFailed` if the zlib stream is damaged
    /// - `Error::InvalidObject` if the header is malformed, names an unknown
    ///   kind, or declares a length different from the payload's
    pub fn read(&self, oid: &Oid) -> Result<RawObject> {
        let path = Self::oid_to_path(oid);
        let compressed = self.backend.read(&path).map_err(|e| match e {
            Error::PathNotFound(_) => Error::ObjectNotFound(oid.to_hex()),
            other => other,
        })?;
        let decompressed = decompress(&compressed)?;
        parse_raw_object(&decompressed, oid)
    }

    /// Reads an object and checks that it has the expected kind.
    ///
    /// Returns the payload.
    pub fn read_typed(&self, oid: &Oid, expected: ObjectType) -> Result<Vec<u8>> {
        let raw = self.read(oid)?;
        if raw.object_type != expected {
            return Err(Error::TypeMismatch {
                expected: expected.as_str(),
                actual: raw.object_type.as_str(),
            });
        }
        Ok(raw.content)
    }

    /// Returns `true` if an object file exists for the id.
    pub fn exists(&self, oid: &Oid) -> bool {
        self.backend.exists(&Self::oid_to_path(oid))
    }

    /// Finds stored objects whose id starts with the given hex prefix.
    ///
    /// # Arguments
    ///
    /// * `prefix` - 4 to 40 hexadecimal characters, any case.
    ///
    /// # Returns
    ///
    /// The matching ids in ascending order.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Oid>> {
        if prefix.len() < 4
            || prefix.len() > OID_HEX_LEN
            || !prefix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidOid(prefix.to_string()));
        }

        let prefix = prefix.to_lowercase();
        let (dir_prefix, file_prefix) = prefix.split_at(2);
        let subdir = Path::new(OBJECTS_DIR).join(dir_prefix);

        let mut matches = Vec::new();
        for file in self.backend.list_files(&subdir)? {
            let name = file.to_string_lossy();
            if !name.starts_with(file_prefix) {
                continue;
            }
            let full_hex = format!("{}{}", dir_prefix, name);
            if let Ok(oid) = Oid::from_hex(&full_hex) {
                matches.push(oid);
            }
        }
        matches.sort();
        Ok(matches)
    }
}

/// Splits a decompressed object into kind and payload.
///
/// The framing is `<kind> <len>\0<payload>`.
fn parse_raw_object(data: &[u8], oid: &Oid) -> Result<RawObject> {
    let invalid = |reason: String| Error::InvalidObject {
        oid: oid.to_hex(),
        reason,
    };

    let null_pos = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| invalid("missing null byte in header".to_string()))?;

    let header = std::str::from_utf8(&data[..null_pos])
        .map_err(|_| invalid("invalid UTF-8 in header".to_string()))?;

    let (type_str, size_str) = header
        .split_once(' ')
        .ok_or_else(|| invalid(format!("malformed header: {:?}", header)))?;

    let object_type = ObjectType::parse(type_str)
        .ok_or_else(|| invalid(format!("unknown object type: {}", type_str)))?;

    let size: usize = size_str
        .parse()
        .map_err(|_| invalid(format!("invalid size: {}", size_str)))?;

    let content = &data[null_pos + 1..];
    if content.len() != size {
        return Err(invalid(format!(
            "size mismatch: header says {} but content is {} bytes",
            size,
            content.len()
        )));
    }

    Ok(RawObject {
        object_type,
        content: content.to_vec(),
    })
}
