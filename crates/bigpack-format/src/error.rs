//! Error types for archive layout decoding

use thiserror::Error;

/// Result type for layout operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while decoding or encoding archive layouts
#[derive(Debug, Error)]
pub enum FormatError {
    /// Input buffer shorter than the fixed layout requires
    #[error("{what} too short: need {needed} bytes, got {actual}")]
    TooShort {
        /// Layout being decoded
        what: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Value does not fit the on-disk bit width
    #[error("{what} value {value} exceeds {bits}-bit range")]
    OutOfRange {
        /// Field being encoded
        what: &'static str,
        /// Offending value
        value: u64,
        /// Width of the on-disk field
        bits: u32,
    },

    /// Decoded value cannot be addressed on this platform
    #[error("{what} value {value} does not fit in usize")]
    Unaddressable {
        /// Field being converted
        what: &'static str,
        /// Offending value
        value: u64,
    },

    /// Binary layout error from binrw
    #[error("binary layout error: {0}")]
    Binary(#[from] binrw::Error),
}
