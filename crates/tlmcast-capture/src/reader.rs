//! Lazy capture playback reader.
//!
//! [`PcapReader`] reads records from any `Read` source, validating the
//! global header on construction. Generic over `R: Read` so tests can use
//! `&[u8]` and production code can use `BufReader<File>`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bytes::Bytes;

use crate::error::{CaptureError, Result};
use crate::format::{PcapHeader, Record, RecordHeader, GLOBAL_HEADER_LEN, RECORD_HEADER_LEN};

/// Reads timestamped records from a capture byte stream, one at a time.
///
/// The stream is consumed exactly once, forward-only; the reader is not
/// restartable. Dropping the reader releases the underlying source.
#[derive(Debug)]
pub struct PcapReader<R: Read> {
    reader: R,
    header: PcapHeader,
    records_read: u64,
}

impl PcapReader<BufReader<File>> {
    /// Open a capture file from a filesystem path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read> PcapReader<R> {
    /// Open a capture stream, reading and validating the global header.
    pub fn open(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; GLOBAL_HEADER_LEN];
        let got = read_fully(&mut reader, &mut buf)?;
        if got < GLOBAL_HEADER_LEN {
            return Err(CaptureError::TruncatedHeader {
                needed: GLOBAL_HEADER_LEN,
                got,
            });
        }
        let header = PcapHeader::decode(&buf)?;
        Ok(Self {
            reader,
            header,
            records_read: 0,
        })
    }

    /// The validated global header.
    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record, or `None` once the stream is exhausted.
    ///
    /// A clean end of file between records is the normal end of replay.
    /// End of file inside a record header or payload is an error.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let index = self.records_read;

        let mut header_buf = [0u8; RECORD_HEADER_LEN];
        let got = read_fully(&mut self.reader, &mut header_buf)?;
        if got == 0 {
            return Ok(None);
        }
        if got < RECORD_HEADER_LEN {
            return Err(CaptureError::TruncatedRecord {
                index,
                needed: RECORD_HEADER_LEN,
                got,
            });
        }

        let record_header = RecordHeader::decode(&header_buf, self.header.endianness);
        let snaplen = self.header.effective_snaplen();
        if record_header.incl_len > snaplen {
            return Err(CaptureError::OversizedRecord {
                index,
                len: record_header.incl_len,
                snaplen,
            });
        }

        let mut payload = vec![0u8; record_header.incl_len as usize];
        let got = read_fully(&mut self.reader, &mut payload)?;
        if got < payload.len() {
            return Err(CaptureError::TruncatedRecord {
                index,
                needed: payload.len(),
                got,
            });
        }

        self.records_read += 1;
        Ok(Some(Record {
            timestamp: record_header.timestamp(self.header.resolution),
            payload: Bytes::from(payload),
        }))
    }

    /// Convert into a record iterator, fused after end of stream or the
    /// first error.
    pub fn records(self) -> RecordIter<R> {
        RecordIter {
            reader: self,
            done: false,
        }
    }
}

/// Iterator adapter over capture records.
pub struct RecordIter<R: Read> {
    reader: PcapReader<R>,
    done: bool,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or the stream ends, returning the byte count.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MAGIC_MICROS, MAGIC_NANOS};

    fn global_header(magic: u32, snaplen: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(GLOBAL_HEADER_LEN);
        buf.extend_from_slice(&magic.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&4u16.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&snaplen.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf
    }

    fn push_record(buf: &mut Vec<u8>, ts_sec: u32, ts_frac: u32, payload: &[u8]) {
        buf.extend_from_slice(&ts_sec.to_le_bytes());
        buf.extend_from_slice(&ts_frac.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
    }

    #[test]
    fn test_open_empty_capture() {
        let buf = global_header(MAGIC_MICROS, 65535);
        let mut reader = PcapReader::open(&buf[..]).unwrap();
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 0);
    }

    #[test]
    fn test_open_short_input() {
        let err = PcapReader::open(&b"pcap"[..]).unwrap_err();
        match err {
            CaptureError::TruncatedHeader { needed, got } => {
                assert_eq!(needed, GLOBAL_HEADER_LEN);
                assert_eq!(got, 4);
            }
            other => panic!("expected TruncatedHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_records_in_order() {
        let mut buf = global_header(MAGIC_MICROS, 65535);
        push_record(&mut buf, 100, 0, b"alpha");
        push_record(&mut buf, 100, 250_000, b"beta");
        push_record(&mut buf, 103, 0, b"");

        let mut reader = PcapReader::open(&buf[..]).unwrap();

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(&first.payload[..], b"alpha");
        assert!((first.timestamp - 100.0).abs() < 1e-9);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(&second.payload[..], b"beta");
        assert!((second.timestamp - 100.25).abs() < 1e-9);

        let third = reader.next_record().unwrap().unwrap();
        assert!(third.is_empty());

        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 3);
    }

    #[test]
    fn test_nanosecond_timestamps() {
        let mut buf = global_header(MAGIC_NANOS, 65535);
        push_record(&mut buf, 7, 500_000_000, b"x");

        let mut reader = PcapReader::open(&buf[..]).unwrap();
        let record = reader.next_record().unwrap().unwrap();
        assert!((record.timestamp - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_record_header() {
        let mut buf = global_header(MAGIC_MICROS, 65535);
        buf.extend_from_slice(&[0u8; 7]);

        let mut reader = PcapReader::open(&buf[..]).unwrap();
        let err = reader.next_record().unwrap_err();
        match err {
            CaptureError::TruncatedRecord { index, needed, got } => {
                assert_eq!(index, 0);
                assert_eq!(needed, RECORD_HEADER_LEN);
                assert_eq!(got, 7);
            }
            other => panic!("expected TruncatedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = global_header(MAGIC_MICROS, 65535);
        push_record(&mut buf, 1, 0, b"full");
        // Second record declares 8 payload bytes but the file ends after 3.
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(b"abc");

        let mut reader = PcapReader::open(&buf[..]).unwrap();
        assert!(reader.next_record().unwrap().is_some());
        let err = reader.next_record().unwrap_err();
        match err {
            CaptureError::TruncatedRecord { index, needed, got } => {
                assert_eq!(index, 1);
                assert_eq!(needed, 8);
                assert_eq!(got, 3);
            }
            other => panic!("expected TruncatedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_record_rejected() {
        let mut buf = global_header(MAGIC_MICROS, 16);
        push_record(&mut buf, 1, 0, &[0u8; 32]);

        let mut reader = PcapReader::open(&buf[..]).unwrap();
        let err = reader.next_record().unwrap_err();
        match err {
            CaptureError::OversizedRecord { index, len, snaplen } => {
                assert_eq!(index, 0);
                assert_eq!(len, 32);
                assert_eq!(snaplen, 16);
            }
            other => panic!("expected OversizedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_iterator_yields_all_then_fuses() {
        let mut buf = global_header(MAGIC_MICROS, 65535);
        push_record(&mut buf, 1, 0, b"a");
        push_record(&mut buf, 2, 0, b"b");

        let reader = PcapReader::open(&buf[..]).unwrap();
        let mut iter = reader.records();
        assert_eq!(&iter.next().unwrap().unwrap().payload[..], b"a");
        assert_eq!(&iter.next().unwrap().unwrap().payload[..], b"b");
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_iterator_fuses_after_error() {
        let mut buf = global_header(MAGIC_MICROS, 65535);
        buf.extend_from_slice(&[0u8; 5]);

        let reader = PcapReader::open(&buf[..]).unwrap();
        let mut iter = reader.records();
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }
}
