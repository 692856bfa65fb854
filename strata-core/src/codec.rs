//! Little-endian `u32` codec for partition contents.
//!
//! Every partition holds a whole number of little-endian 32-bit unsigned
//! integers; this is the wire format shared with remote executors.

use crate::error::{Result, StrataError};
use byteorder::{ByteOrder, LittleEndian};

/// Decode a byte buffer as little-endian `u32` values.
///
/// Fails with `Unaligned` if the buffer is not a multiple of 4 bytes.
pub fn decode(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(StrataError::Unaligned {
            nbyte: bytes.len() as u64,
        });
    }
    let mut out = vec![0u32; bytes.len() / 4];
    LittleEndian::read_u32_into(bytes, &mut out);
    Ok(out)
}

/// Encode `u32` values as little-endian bytes.
#[must_use]
pub fn encode(ints: &[u32]) -> Vec<u8> {
    let mut out = vec![0u8; ints.len() * 4];
    LittleEndian::write_u32_into(ints, &mut out);
    out
}
