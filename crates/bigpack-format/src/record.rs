//! Data file record prefix
//!
//! Every record in the data file starts with a fixed 16-byte prefix:
//!
//! ```text
//! [size_low: u32 LE][size_high: u8][content fingerprint: 10 bytes][flags: u8]
//! ```
//!
//! followed immediately by `size` payload bytes. The size is 40 bits wide:
//! the low word plus one extension byte.

use crate::error::{FormatError, FormatResult};
use crate::fingerprint::Fingerprint;
use crate::le::{self, U40_MAX};
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use std::fmt;
use std::io::Cursor;

/// Size of the record prefix in bytes
pub const RECORD_PREFIX_SIZE: usize = 16;

/// Largest payload a record can describe
pub const MAX_RECORD_SIZE: u64 = U40_MAX;

/// Record flag bitmap
#[derive(BinRead, BinWrite, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecordFlags(pub u8);

impl RecordFlags {
    /// Payload is stored DEFLATE-compressed
    pub const COMPRESSED: u8 = 0x01;

    /// Record is a tombstone; the content was withdrawn
    pub const DELETED: u8 = 0x02;

    /// Create flags from the raw byte
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get raw value
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Check if flag is set
    pub const fn has(&self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Payload is compressed at rest
    pub const fn is_compressed(&self) -> bool {
        self.has(Self::COMPRESSED)
    }

    /// Record is a tombstone
    pub const fn is_deleted(&self) -> bool {
        self.has(Self::DELETED)
    }

    /// Set flag
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Clear flag
    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }
}

impl fmt::Display for RecordFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl From<u8> for RecordFlags {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Decoded 16-byte record prefix
#[derive(BinRead, BinWrite, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[brw(little)]
pub struct RecordPrefix {
    size_low: u32,
    size_high: u8,
    /// Fingerprint of the stored payload (served as the `ETag`)
    pub fingerprint: Fingerprint,
    /// Flag bitmap
    pub flags: RecordFlags,
}

impl RecordPrefix {
    /// Create a prefix for a payload of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::OutOfRange` if `size` exceeds 40 bits.
    pub fn new(size: u64, fingerprint: Fingerprint, flags: RecordFlags) -> FormatResult<Self> {
        let (size_low, size_high) = le::split_u40(size)?;
        Ok(Self {
            size_low,
            size_high,
            fingerprint,
            flags,
        })
    }

    /// Payload size in bytes (40 bits)
    pub fn size(&self) -> u64 {
        le::join_u40(self.size_low, self.size_high)
    }

    /// Decode a prefix from the front of `bytes`
    pub fn parse(bytes: &[u8]) -> FormatResult<Self> {
        if bytes.len() < RECORD_PREFIX_SIZE {
            return Err(FormatError::TooShort {
                what: "record prefix",
                needed: RECORD_PREFIX_SIZE,
                actual: bytes.len(),
            });
        }
        let mut cursor = Cursor::new(&bytes[..RECORD_PREFIX_SIZE]);
        Ok(cursor.read_le()?)
    }

    /// Encode the prefix
    pub fn to_bytes(&self) -> FormatResult<[u8; RECORD_PREFIX_SIZE]> {
        let mut out = [0u8; RECORD_PREFIX_SIZE];
        let mut cursor = Cursor::new(&mut out[..]);
        cursor.write_le(self)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefix_layout() {
        let fingerprint = Fingerprint::from_bytes([0xA0; 10]);
        let prefix = RecordPrefix::new(11, fingerprint, RecordFlags::new(0)).unwrap();
        let bytes = prefix.to_bytes().unwrap();

        assert_eq!(&bytes[..4], &11u32.to_le_bytes());
        assert_eq!(bytes[4], 0);
        assert_eq!(&bytes[5..15], &[0xA0; 10]);
        assert_eq!(bytes[15], 0);
        assert_eq!(RecordPrefix::parse(&bytes).unwrap(), prefix);
    }

    #[test]
    fn test_prefix_size_high_byte() {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&5u32.to_le_bytes());
        bytes[4] = 2;
        bytes[15] = RecordFlags::COMPRESSED;

        let prefix = RecordPrefix::parse(&bytes).unwrap();
        assert_eq!(prefix.size(), (2u64 << 32) + 5);
        assert!(prefix.flags.is_compressed());
        assert!(!prefix.flags.is_deleted());
    }

    #[test]
    fn test_prefix_rejects_oversized_payload() {
        assert!(matches!(
            RecordPrefix::new(MAX_RECORD_SIZE + 1, Fingerprint::default(), RecordFlags::default()),
            Err(FormatError::OutOfRange { bits: 40, .. })
        ));
        let prefix =
            RecordPrefix::new(MAX_RECORD_SIZE, Fingerprint::default(), RecordFlags::default())
                .unwrap();
        assert_eq!(prefix.size(), MAX_RECORD_SIZE);
    }

    #[test]
    fn test_prefix_too_short() {
        assert!(matches!(
            RecordPrefix::parse(&[0u8; 9]),
            Err(FormatError::TooShort { actual: 9, .. })
        ));
    }

    #[test]
    fn test_flags() {
        let mut flags = RecordFlags::default();
        assert!(!flags.is_compressed());
        flags.set(RecordFlags::DELETED);
        assert!(flags.is_deleted());
        flags.set(RecordFlags::COMPRESSED);
        assert_eq!(flags.value(), 0x03);
        flags.clear(RecordFlags::DELETED);
        assert_eq!(flags, RecordFlags::from(0x01));
        assert_eq!(flags.to_string(), "0x01");
    }
}
