#![warn(missing_docs)]

//! tlmcast capture subsystem: pcap decoding and lazy record iteration
//!
//! A capture is read exactly once, forward-only. [`PcapReader`] validates
//! the global header on open and yields one timestamped [`Record`] at a
//! time; end of stream is not an error.

pub mod error;
pub mod format;
pub mod reader;

pub use error::{CaptureError, Result};
pub use format::{Endianness, PcapHeader, Record, RecordHeader, TimeResolution};
pub use reader::{PcapReader, RecordIter};
