//! Object ID (SHA-1 digest) representation.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::infra::hash_object;

/// The length of an object ID in bytes.
pub const OID_BYTES: usize = 20;

/// The length of an object ID as a hexadecimal string.
pub const OID_HEX_LEN: usize = 40;

/// An object ID.
///
/// The SHA-1 digest of `"<kind> <len>\0" + payload`. Two ids are equal iff
/// their bytes are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    bytes: [u8; OID_BYTES],
}

impl Oid {
    /// Creates an Oid from a 40-character hexadecimal string.
    ///
    /// Upper- and lowercase digits are accepted; the canonical form is
    /// lowercase.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitty::objects::Oid;
    ///
    /// let oid = Oid::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
    /// assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    /// ```
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != OID_HEX_LEN {
            return Err(Error::InvalidOid(hex_str.to_string()));
        }

        let mut bytes = [0u8; OID_BYTES];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|_| Error::InvalidOid(hex_str.to_string()))?;
        Ok(Oid { bytes })
    }

    /// Creates an Oid from a 20-byte array.
    pub fn from_bytes(bytes: [u8; OID_BYTES]) -> Self {
        Oid { bytes }
    }

    /// Creates an Oid from a slice that must be exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; OID_BYTES] = slice
            .try_into()
            .map_err(|_| Error::InvalidOid(hex::encode(slice)))?;
        Ok(Oid { bytes })
    }

    /// Computes the id an object of the given kind and payload would get.
    pub fn hash_object(kind: &str, payload: &[u8]) -> Self {
        Oid {
            bytes: hash_object(kind, payload),
        }
    }

    /// Returns the lowercase 40-character hexadecimal form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns the first 7 hex characters, for display.
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    /// Returns a reference to the raw 20-byte array.
    pub fn as_bytes(&self) -> &[u8; OID_BYTES] {
        &self.bytes
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short())
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::from_hex(s)
    }
}
