//! 80-bit path and content fingerprints

use binrw::{BinRead, BinWrite};
use std::fmt;

/// Width of a fingerprint in bytes
pub const FINGERPRINT_SIZE: usize = 10;

/// Truncated MD5 digest (first 10 bytes) used as the lookup key.
///
/// Path fingerprints key both index levels; content fingerprints are stored in
/// each record prefix and double as the HTTP `ETag`. Ordering is plain
/// lexicographic byte order, which is the order the index files are sorted in.
/// Collisions are not detected.
#[derive(
    BinRead, BinWrite, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Create fingerprint from raw bytes
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create fingerprint from the first 10 bytes of a slice.
    ///
    /// Returns `None` when the slice is shorter than a fingerprint.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let head = bytes.get(..FINGERPRINT_SIZE)?;
        let mut out = [0u8; FINGERPRINT_SIZE];
        out.copy_from_slice(head);
        Some(Self(out))
    }

    /// Fingerprint arbitrary data (MD5, truncated to 80 bits)
    pub fn of(data: &[u8]) -> Self {
        let digest = md5::compute(data);
        let mut out = [0u8; FINGERPRINT_SIZE];
        out.copy_from_slice(&digest.0[..FINGERPRINT_SIZE]);
        Self(out)
    }

    /// Fingerprint an already-normalized archive path
    pub fn from_path(path: &str) -> Self {
        Self::of(path.as_bytes())
    }

    /// Parse fingerprint from a 20-character hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }

    /// Convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; FINGERPRINT_SIZE]> for Fingerprint {
    fn from(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_truncated_md5() {
        let full = md5::compute(b"index.html");
        let fingerprint = Fingerprint::from_path("index.html");
        assert_eq!(fingerprint.as_bytes(), &full.0[..10]);
    }

    #[test]
    fn test_known_digest() {
        // md5("Hello, World!") = 65a8e27d8879283831b664bd8b7f0ad4
        let fingerprint = Fingerprint::of(b"Hello, World!");
        assert_eq!(fingerprint.to_hex(), "65a8e27d8879283831b6");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            Fingerprint::from_path("css/site.css"),
            Fingerprint::from_path("css/site.css")
        );
        assert_ne!(
            Fingerprint::from_path("css/site.css"),
            Fingerprint::from_path("/css/site.css")
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let original = Fingerprint::from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x01, 0x02,
        ]);
        let hex = original.to_hex();
        assert_eq!(hex, "123456789abcdef00102");
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), original);
        assert!(Fingerprint::from_hex("1234").is_err());
    }

    #[test]
    fn test_from_slice() {
        assert!(Fingerprint::from_slice(&[1, 2, 3]).is_none());
        let bytes = [7u8; 16];
        assert_eq!(
            Fingerprint::from_slice(&bytes),
            Some(Fingerprint::from_bytes([7; 10]))
        );
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let low = Fingerprint::from_bytes([0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff]);
        let high = Fingerprint::from_bytes([1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(low < high);
    }
}
