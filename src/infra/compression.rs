//! Zlib compression for stored objects.

use crate::error::{Error, Result};

/// Compression level used for every object written by the store.
const LEVEL: u8 = 6;

/// Compresses data using zlib (DEFLATE with zlib header and checksum).
pub fn compress(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, LEVEL)
}

/// Decompresses zlib-compressed data.
///
/// # Errors
///
/// Returns `Error::DecompressionFailed` if:
/// - The input is shorter than a zlib header
/// - The zlib header is invalid
/// - The compressed data is corrupted or truncated
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 || !is_valid_zlib_header(data[0], data[1]) {
        return Err(Error::DecompressionFailed);
    }

    miniz_oxide::inflate::decompress_to_vec_zlib(data).map_err(|_| Error::DecompressionFailed)
}

/// Validates a zlib header.
///
/// CM (low nibble of CMF) must be 8, CINFO at most 7, and
/// `(CMF * 256 + FLG) % 31 == 0`.
fn is_valid_zlib_header(cmf: u8, flg: u8) -> bool {
    if cmf & 0x0F != 8 {
        return false;
    }
    if (cmf >> 4) & 0x0F > 7 {
        return false;
    }
    ((cmf as u16) * 256 + (flg as u16)) % 31 == 0
}
