//! Index file parser.

use std::io::{Cursor, Read};

use crate::error::{Error, Result};
use crate::infra::hash::{sha1, SHA1_SIZE};
use crate::objects::oid::OID_BYTES;
use crate::objects::Oid;

use super::writer::{padding_len, INDEX_SIGNATURE};
use super::{Index, IndexEntry, INDEX_VERSION};

const HEADER_LEN: usize = 12;

/// Parses an index file from raw bytes.
///
/// The trailing checksum is verified before anything else is looked at.
///
/// # Errors
///
/// - `Error::ChecksumMismatch` if the trailer is not the SHA-1 of the
///   preceding bytes
/// - `Error::InvalidIndex` if the signature is not "DIRC", the version is
///   not 2, or the data is truncated or malformed
pub fn parse(data: &[u8]) -> Result<Index> {
    if data.len() < HEADER_LEN + SHA1_SIZE {
        return Err(Error::InvalidIndex {
            version: 0,
            reason: format!("file too short: {} bytes", data.len()),
        });
    }

    let (body, trailer) = data.split_at(data.len() - SHA1_SIZE);
    let actual = sha1(body);
    if actual[..] != trailer[..] {
        return Err(Error::ChecksumMismatch {
            expected: hex::encode(trailer),
            actual: hex::encode(actual),
        });
    }

    let mut cursor = Cursor::new(body);
    let entry_count = parse_header(&mut cursor)?;

    let mut entries = Vec::new();
    for _ in 0..entry_count {
        entries.push(parse_entry(&mut cursor)?);
    }

    if (cursor.position() as usize) != body.len() {
        return Err(Error::InvalidIndex {
            version: INDEX_VERSION,
            reason: "unexpected bytes after last entry".to_string(),
        });
    }

    Ok(Index::from_entries(entries))
}

/// Parses the 12-byte header and returns the entry count.
fn parse_header(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut sig = [0u8; 4];
    cursor
        .read_exact(&mut sig)
        .map_err(|_| make_error(0, "failed to read signature"))?;

    if &sig != INDEX_SIGNATURE {
        return Err(Error::InvalidIndex {
            version: 0,
            reason: format!(
                "invalid signature: expected DIRC, got {:?}",
                String::from_utf8_lossy(&sig)
            ),
        });
    }

    let version = read_u32_be(cursor).map_err(|_| make_error(0, "failed to read version"))?;
    if version != INDEX_VERSION {
        return Err(Error::InvalidIndex {
            version,
            reason: format!("unsupported version: {}", version),
        });
    }

    read_u32_be(cursor).map_err(|_| make_error(version, "failed to read entry count"))
}

fn parse_entry(cursor: &mut Cursor<&[u8]>) -> Result<IndexEntry> {
    let field = |name: &str| make_error(INDEX_VERSION, &format!("truncated entry: {}", name));

    let mtime_secs = read_u32_be(cursor).map_err(|_| field("mtime"))?;
    let mtime_nanos = read_u32_be(cursor).map_err(|_| field("mtime remainder"))?;

    // ctime, dev, ino, mode, uid/gid slots are written as zero and ignored
    let mut unused = [0u8; 20];
    cursor
        .read_exact(&mut unused)
        .map_err(|_| field("reserved"))?;

    let size = read_u32_be(cursor).map_err(|_| field("size"))?;

    let mut oid_bytes = [0u8; OID_BYTES];
    cursor
        .read_exact(&mut oid_bytes)
        .map_err(|_| field("id"))?;

    let mut flags = [0u8; 2];
    cursor.read_exact(&mut flags).map_err(|_| field("flags"))?;

    let path_bytes = read_until_nul(cursor).map_err(|_| field("path"))?;
    let path = String::from_utf8(path_bytes)
        .map_err(|_| make_error(INDEX_VERSION, "invalid UTF-8 in entry path"))?;

    let mut padding = vec![0u8; padding_len(path.len())];
    cursor
        .read_exact(&mut padding)
        .map_err(|_| field("padding"))?;

    Ok(IndexEntry::new(
        path,
        Oid::from_bytes(oid_bytes),
        size,
        mtime_secs,
        mtime_nanos,
    ))
}

/// Reads bytes up to and including a NUL; returns them without the NUL.
fn read_until_nul(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        cursor.read_exact(&mut byte)?;
        if byte[0] == 0 {
            return Ok(bytes);
        }
        bytes.push(byte[0]);
    }
}

/// Reads a big-endian u32 from the cursor.
fn read_u32_be(cursor: &mut Cursor<&[u8]>) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn make_error(version: u32, reason: &str) -> Error {
    Error::InvalidIndex {
        version,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::serialize;

    fn sample_index() -> Index {
        Index::from_entries(vec![
            IndexEntry::new("a.txt", Oid::from_bytes([1; 20]), 5, 1700000000, 1),
            IndexEntry::new("b/c.txt", Oid::from_bytes([2; 20]), 5, 1700000001, 999_999),
            IndexEntry::new("exactly-10", Oid::from_bytes([3; 20]), 0, 0, 0),
        ])
    }

    /// Recomputes the trailer after tampering with the body.
    fn reseal(mut data: Vec<u8>) -> Vec<u8> {
        let body_len = data.len() - SHA1_SIZE;
        let checksum = sha1(&data[..body_len]);
        data[body_len..].copy_from_slice(&checksum);
        data
    }

    #[test]
    fn test_parse_serialized() {
        let index = sample_index();
        assert_eq!(parse(&serialize(&index).unwrap()).unwrap(), index);
    }

    #[test]
    fn test_parse_empty_index() {
        let index = parse(&serialize(&Index::new()).unwrap()).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_every_flipped_byte_fails_checksum() {
        let data = serialize(&sample_index()).unwrap();
        for i in 0..data.len() {
            let mut corrupted = data.clone();
            corrupted[i] ^= 0x40;
            assert!(
                matches!(parse(&corrupted), Err(Error::ChecksumMismatch { .. })),
                "flipping byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_checksum_checked_before_signature() {
        let mut data = serialize(&Index::new()).unwrap();
        data[0] = b'X';
        assert!(matches!(parse(&data), Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_bad_signature() {
        let mut data = serialize(&Index::new()).unwrap();
        data[0..4].copy_from_slice(b"CRID");
        let result = parse(&reseal(data));
        assert!(matches!(result, Err(Error::InvalidIndex { version: 0, .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = serialize(&Index::new()).unwrap();
        data[4..8].copy_from_slice(&3u32.to_be_bytes());
        let result = parse(&reseal(data));
        assert!(matches!(result, Err(Error::InvalidIndex { version: 3, .. })));
    }

    #[test]
    fn test_truncated_body() {
        let data = serialize(&sample_index()).unwrap();
        // claim one more entry than is present
        let mut tampered = data.clone();
        tampered[8..12].copy_from_slice(&4u32.to_be_bytes());
        assert!(matches!(
            parse(&reseal(tampered)),
            Err(Error::InvalidIndex { .. })
        ));

        // drop the middle of the body but keep a valid trailer
        let body = &data[..data.len() - SHA1_SIZE];
        let mut short = body[..body.len() - 10].to_vec();
        short.extend_from_slice(&sha1(&short));
        assert!(matches!(parse(&short), Err(Error::InvalidIndex { .. })));
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(parse(b"DIRC"), Err(Error::InvalidIndex { .. })));
        assert!(matches!(parse(&[]), Err(Error::InvalidIndex { .. })));
    }

    #[test]
    fn test_trailing_garbage() {
        let data = serialize(&Index::new()).unwrap();
        let mut body = data[..data.len() - SHA1_SIZE].to_vec();
        body.extend_from_slice(b"junk");
        body.extend_from_slice(&sha1(&body));
        assert!(matches!(parse(&body), Err(Error::InvalidIndex { .. })));
    }
}
