//! pcap file format: fixed-size headers and timestamped records.
//!
//! The classic pcap layout is a 24-byte global header followed by
//! records, each prefixed with a 16-byte record header. The magic number
//! fixes both the byte order of every later header field and the
//! resolution of the fractional timestamp field.

use bytes::Bytes;

use crate::error::{CaptureError, Result};

/// Size of the pcap global header in bytes
/// (magic:4 + version:4 + thiszone:4 + sigfigs:4 + snaplen:4 + linktype:4).
pub const GLOBAL_HEADER_LEN: usize = 24;

/// Size of a per-record header in bytes
/// (ts_sec:4 + ts_frac:4 + incl_len:4 + orig_len:4).
pub const RECORD_HEADER_LEN: usize = 16;

/// Magic for microsecond captures written in the reader's native order.
pub const MAGIC_MICROS: u32 = 0xA1B2_C3D4;

/// Byte-swapped microsecond magic (opposite-endian writer).
pub const MAGIC_MICROS_SWAPPED: u32 = 0xD4C3_B2A1;

/// Magic for nanosecond captures.
pub const MAGIC_NANOS: u32 = 0xA1B2_3C4D;

/// Byte-swapped nanosecond magic.
pub const MAGIC_NANOS_SWAPPED: u32 = 0x4D3C_B2A1;

/// Major format version this reader understands.
pub const SUPPORTED_VERSION_MAJOR: u16 = 2;

/// Captured-length cap applied when a file declares snaplen 0.
pub const DEFAULT_SNAPLEN_CAP: u32 = 0x0400_0000;

/// Byte order of header fields after the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Fields are little-endian.
    Little,
    /// Fields are big-endian.
    Big,
}

impl Endianness {
    /// Decode a u16 field in this byte order.
    pub fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Decode a u32 field in this byte order.
    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Resolution of the fractional half of a record timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeResolution {
    /// `ts_frac` counts microseconds.
    Micro,
    /// `ts_frac` counts nanoseconds.
    Nano,
}

impl TimeResolution {
    /// Ticks per second for this resolution.
    pub fn ticks_per_second(self) -> f64 {
        match self {
            TimeResolution::Micro => 1e6,
            TimeResolution::Nano => 1e9,
        }
    }
}

/// Decoded pcap global header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapHeader {
    /// Declared major format version.
    pub version_major: u16,
    /// Declared minor format version.
    pub version_minor: u16,
    /// Per-record captured-length limit (0 means "no limit declared").
    pub snaplen: u32,
    /// Link-layer type of the captured payloads.
    pub linktype: u32,
    /// Byte order of all subsequent header fields.
    pub endianness: Endianness,
    /// Timestamp resolution of all subsequent records.
    pub resolution: TimeResolution,
}

impl PcapHeader {
    /// Decode and validate a global header from its raw bytes.
    pub fn decode(bytes: &[u8; GLOBAL_HEADER_LEN]) -> Result<Self> {
        let raw_magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let (endianness, resolution) = match raw_magic {
            MAGIC_MICROS => (Endianness::Little, TimeResolution::Micro),
            MAGIC_MICROS_SWAPPED => (Endianness::Big, TimeResolution::Micro),
            MAGIC_NANOS => (Endianness::Little, TimeResolution::Nano),
            MAGIC_NANOS_SWAPPED => (Endianness::Big, TimeResolution::Nano),
            got => return Err(CaptureError::BadMagic { got }),
        };

        let version_major = endianness.read_u16([bytes[4], bytes[5]]);
        let version_minor = endianness.read_u16([bytes[6], bytes[7]]);
        if version_major != SUPPORTED_VERSION_MAJOR {
            return Err(CaptureError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        // thiszone (offset 8) and sigfigs (offset 12) are dead fields in
        // every writer encountered in practice; decoded positions skipped.
        let snaplen = endianness.read_u32([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let linktype = endianness.read_u32([bytes[20], bytes[21], bytes[22], bytes[23]]);

        Ok(Self {
            version_major,
            version_minor,
            snaplen,
            linktype,
            endianness,
            resolution,
        })
    }

    /// Captured-length limit to enforce on records from this file.
    pub fn effective_snaplen(&self) -> u32 {
        if self.snaplen == 0 {
            DEFAULT_SNAPLEN_CAP
        } else {
            self.snaplen
        }
    }
}

/// Decoded per-record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Whole seconds of the capture timestamp.
    pub ts_sec: u32,
    /// Fractional timestamp, in the file's declared resolution.
    pub ts_frac: u32,
    /// Bytes of payload actually stored in the file.
    pub incl_len: u32,
    /// Original on-the-wire length of the payload.
    pub orig_len: u32,
}

impl RecordHeader {
    /// Decode a record header from its raw bytes.
    pub fn decode(bytes: &[u8; RECORD_HEADER_LEN], endianness: Endianness) -> Self {
        Self {
            ts_sec: endianness.read_u32([bytes[0], bytes[1], bytes[2], bytes[3]]),
            ts_frac: endianness.read_u32([bytes[4], bytes[5], bytes[6], bytes[7]]),
            incl_len: endianness.read_u32([bytes[8], bytes[9], bytes[10], bytes[11]]),
            orig_len: endianness.read_u32([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    /// Absolute capture timestamp in seconds.
    pub fn timestamp(&self, resolution: TimeResolution) -> f64 {
        self.ts_sec as f64 + self.ts_frac as f64 / resolution.ticks_per_second()
    }
}

/// One timestamped payload extracted from a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Absolute capture timestamp in seconds. Non-decreasing in practice,
    /// not guaranteed by the format.
    pub timestamp: f64,
    /// Raw payload bytes, delivered verbatim.
    pub payload: Bytes,
}

impl Record {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the record carries no payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
