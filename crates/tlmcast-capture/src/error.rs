//! Capture decoding errors.

use thiserror::Error;

/// Errors produced while opening or decoding a capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Underlying I/O failure reading the capture source.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file does not start with a recognized pcap magic number.
    #[error("bad capture magic: 0x{got:08X}")]
    BadMagic {
        /// The magic value actually read, little-endian interpretation.
        got: u32,
    },

    /// The capture declares a format version this reader does not speak.
    #[error("unsupported capture version {major}.{minor}")]
    UnsupportedVersion {
        /// Declared major version.
        major: u16,
        /// Declared minor version.
        minor: u16,
    },

    /// The source ended before a complete global header was read.
    #[error("truncated capture header: needed {needed} bytes, got {got}")]
    TruncatedHeader {
        /// Bytes required for the header.
        needed: usize,
        /// Bytes actually available.
        got: usize,
    },

    /// The source ended partway through a record header or payload.
    #[error("truncated record {index}: needed {needed} bytes, got {got}")]
    TruncatedRecord {
        /// Zero-based index of the incomplete record.
        index: u64,
        /// Bytes required to complete it.
        needed: usize,
        /// Bytes actually available.
        got: usize,
    },

    /// A record claims a captured length beyond the file's snapshot length.
    #[error("record {index} length {len} exceeds snaplen {snaplen}")]
    OversizedRecord {
        /// Zero-based index of the offending record.
        index: u64,
        /// Captured length the record declares.
        len: u32,
        /// Effective snapshot length limit.
        snaplen: u32,
    },
}

/// Result alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
