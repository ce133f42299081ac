//! Little-endian helpers for the packed integer widths used on disk.
//!
//! Two widths are not native integer sizes:
//!
//! - **48-bit offsets** in map entries (6 bytes, addresses up to 256 TiB)
//! - **40-bit sizes** in record prefixes, split into a `u32` low word and a
//!   one-byte high extension
//!
//! Decoding widens into `u64`; encoding rejects values that do not fit.

use crate::error::{FormatError, FormatResult};

/// Width of a packed map offset in bytes
pub const U48_SIZE: usize = 6;

/// Largest value representable in 48 bits
pub const U48_MAX: u64 = (1 << 48) - 1;

/// Largest value representable in 40 bits
pub const U40_MAX: u64 = (1 << 40) - 1;

/// Decode a 6-byte little-endian unsigned integer
pub fn read_u48(bytes: [u8; U48_SIZE]) -> u64 {
    let mut wide = [0u8; 8];
    wide[..U48_SIZE].copy_from_slice(&bytes);
    u64::from_le_bytes(wide)
}

/// Encode a value as 6 little-endian bytes.
///
/// # Errors
///
/// Returns `FormatError::OutOfRange` if `value` exceeds 48 bits.
pub fn write_u48(value: u64) -> FormatResult<[u8; U48_SIZE]> {
    if value > U48_MAX {
        return Err(FormatError::OutOfRange {
            what: "map offset",
            value,
            bits: 48,
        });
    }
    let wide = value.to_le_bytes();
    let mut out = [0u8; U48_SIZE];
    out.copy_from_slice(&wide[..U48_SIZE]);
    Ok(out)
}

/// Join the low word and high byte of a record size into its 40-bit value
pub fn join_u40(low: u32, high: u8) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Split a 40-bit record size into its low word and high byte.
///
/// # Errors
///
/// Returns `FormatError::OutOfRange` if `value` exceeds 40 bits.
pub fn split_u40(value: u64) -> FormatResult<(u32, u8)> {
    if value > U40_MAX {
        return Err(FormatError::OutOfRange {
            what: "record size",
            value,
            bits: 40,
        });
    }
    let low = (value & 0xFFFF_FFFF) as u32;
    let high = (value >> 32) as u8;
    Ok((low, high))
}

/// Convert a decoded on-disk quantity into an in-memory length.
///
/// # Errors
///
/// Returns `FormatError::Unaddressable` on platforms where `usize` is narrower
/// than the value (32-bit targets reading large records).
pub fn to_usize(value: u64, what: &'static str) -> FormatResult<usize> {
    usize::try_from(value).map_err(|_| FormatError::Unaddressable { what, value })
}
