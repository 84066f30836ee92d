//! Index file writer.

use crate::error::{Error, Result};
use crate::infra::hash::sha1;

use super::{Index, IndexEntry, INDEX_VERSION};

/// The magic signature at the start of an index file: "DIRC"
pub(super) const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Bytes from the start of an entry up to (not including) its path.
pub(super) const ENTRY_FIXED_LEN: usize = 54;

/// Returns the number of zero bytes that follow an entry's NUL terminator.
///
/// Always between 1 and 8.
pub(super) fn padding_len(path_len: usize) -> usize {
    let unpadded = 62 + path_len;
    round_up8(unpadded + 1) - unpadded
}

fn round_up8(n: usize) -> usize {
    (n + 7) & !7
}

/// Serializes the index, trailing checksum included.
///
/// Layout (integers big-endian):
/// - 12-byte header: `DIRC`, version, entry count
/// - each entry: mtime seconds, mtime remainder, five zero words, size,
///   20 id bytes, zero flags, path, NUL, zero padding
/// - SHA-1 of everything before it
///
/// # Errors
///
/// `Error::InvalidPath` if an entry path contains a NUL byte, since the
/// reader could not find where such a path ends.
pub fn serialize(index: &Index) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.extend_from_slice(INDEX_SIGNATURE);
    buffer.extend_from_slice(&INDEX_VERSION.to_be_bytes());
    buffer.extend_from_slice(&(index.len() as u32).to_be_bytes());

    for entry in index.entries() {
        write_entry(&mut buffer, entry)?;
    }

    let checksum = sha1(&buffer);
    buffer.extend_from_slice(&checksum);
    Ok(buffer)
}

fn write_entry(buffer: &mut Vec<u8>, entry: &IndexEntry) -> Result<()> {
    let path = entry.path().as_bytes();
    if path.contains(&0) {
        return Err(Error::InvalidPath {
            path: entry.path().escape_default().to_string(),
            reason: "NUL byte in index path".to_string(),
        });
    }
    buffer.reserve(ENTRY_FIXED_LEN + path.len() + 8);

    let (secs, nanos) = entry.mtime();
    buffer.extend_from_slice(&secs.to_be_bytes());
    buffer.extend_from_slice(&nanos.to_be_bytes());

    // unused stat fields
    for _ in 0..5 {
        buffer.extend_from_slice(&0u32.to_be_bytes());
    }

    buffer.extend_from_slice(&entry.size().to_be_bytes());
    buffer.extend_from_slice(entry.oid().as_bytes());
    buffer.extend_from_slice(&0u16.to_be_bytes());

    buffer.extend_from_slice(path);
    buffer.push(0);
    buffer.resize(buffer.len() + padding_len(path.len()), 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::hash::SHA1_SIZE;
    use crate::objects::Oid;

    fn make_entry(path: &str) -> IndexEntry {
        IndexEntry::new(path, Oid::from_bytes([0xab; 20]), 42, 1700000001, 7)
    }

    #[test]
    fn test_padding_len() {
        // 62 + 1 = 63 -> 64
        assert_eq!(padding_len(1), 1);
        // 62 + 2 = 64 -> 65 rounds to 72
        assert_eq!(padding_len(2), 8);
        assert_eq!(padding_len(9), 1);
        assert_eq!(padding_len(10), 8);
        for len in 0..64 {
            let pad = padding_len(len);
            assert!((1..=8).contains(&pad));
            assert_eq!((62 + len + pad) % 8, 0);
        }
    }

    #[test]
    fn test_serialize_empty_index() {
        let data = serialize(&Index::new()).unwrap();

        assert_eq!(data.len(), 12 + SHA1_SIZE);
        assert_eq!(&data[0..4], b"DIRC");
        assert_eq!(u32::from_be_bytes(data[4..8].try_into().unwrap()), 2);
        assert_eq!(u32::from_be_bytes(data[8..12].try_into().unwrap()), 0);
        assert_eq!(&data[12..], &sha1(&data[..12]));
    }

    #[test]
    fn test_serialize_entry_layout() {
        let data = serialize(&Index::from_entries(vec![make_entry("a.txt")])).unwrap();
        let entry = &data[12..data.len() - SHA1_SIZE];

        let word = |i: usize| u32::from_be_bytes(entry[i * 4..i * 4 + 4].try_into().unwrap());
        assert_eq!(word(0), 1700000001);
        assert_eq!(word(1), 7);
        for i in 2..7 {
            assert_eq!(word(i), 0);
        }
        assert_eq!(word(7), 42);
        assert_eq!(&entry[32..52], &[0xab; 20]);
        assert_eq!(&entry[52..54], &[0, 0]);
        assert_eq!(&entry[ENTRY_FIXED_LEN..ENTRY_FIXED_LEN + 5], b"a.txt");
        assert_eq!(entry[ENTRY_FIXED_LEN + 5], 0);

        let pad = padding_len(5);
        assert_eq!(entry.len(), ENTRY_FIXED_LEN + 5 + 1 + pad);
        assert!(entry[ENTRY_FIXED_LEN + 6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let index = Index::from_entries(vec![make_entry("x"), make_entry("dir/y")]);
        assert_eq!(serialize(&index).unwrap(), serialize(&index).unwrap());
    }

    #[test]
    fn test_serialize_rejects_nul_in_path() {
        let index = Index::from_entries(vec![make_entry("ok.txt"), make_entry("a\0b")]);
        assert!(matches!(
            serialize(&index),
            Err(Error::InvalidPath { .. })
        ));
    }
}
