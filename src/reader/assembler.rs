//! Chunk reassembly for the record stream.
//!
//! The transport hands over chunks of arbitrary size with no relation to
//! record boundaries. The assembler buffers them and walks a two-state
//! machine, waiting first for a full 8-byte header and then for the record
//! body the header announced, emitting complete records as they close.
//! [`StreamAssembler::feed`] is pure with respect to I/O, which keeps the
//! reassembly logic testable without any transport.
//!
//! Record boundaries carry no resynchronization marker, so any error here
//! is fatal for the stream: there is no way to find the next header after
//! a corrupt record.

use std::collections::HashMap;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{DecodeError, StreamError};

use super::header::{WireHeader, REC_HDR_SIZE};

/// Consecutive empty transport reads tolerated before the stream is
/// declared stalled.
pub const MAX_EMPTY_CHUNKS: u32 = 10;

/// A complete record sliced out of the stream, not yet decoded.
#[derive(Debug, Clone)]
pub struct WireRecord {
    /// Record type name (NUL terminator already dropped).
    pub type_name: String,
    /// The record's data region.
    pub data: Bytes,
}

/// Reassembly state: what the assembler is waiting to complete next.
#[derive(Debug, Clone, Copy)]
enum AssemblerState {
    AwaitingHeader,
    AwaitingRecordBody { type_len: usize, data_len: usize },
}

/// The chunk-reassembly state machine.
///
/// One assembler serves one stream; concurrent requests each get their
/// own. Feed it chunks as they arrive, then call [`finish`](Self::finish)
/// when the transport signals end of stream.
pub struct StreamAssembler {
    state: AssemblerState,
    buffer: BytesMut,
    bytes_read: u64,
    bytes_processed: u64,
    num_chunks: u64,
    empty_chunks: u64,
    consecutive_empty: u32,
}

impl StreamAssembler {
    /// Create an assembler for a new stream.
    pub fn new() -> Self {
        Self {
            state: AssemblerState::AwaitingHeader,
            buffer: BytesMut::new(),
            bytes_read: 0,
            bytes_processed: 0,
            num_chunks: 0,
            empty_chunks: 0,
            consecutive_empty: 0,
        }
    }

    /// Feed one transport chunk and collect every record it completes.
    ///
    /// An empty chunk counts toward the stall guard; any data chunk resets
    /// the consecutive-empty run. Leftover bytes beyond the last complete
    /// record stay buffered as the start of the next header.
    ///
    /// # Errors
    /// - `StreamError::VersionMismatch` on the first bad header; no
    ///   further records are produced
    /// - `StreamError::Stalled` after more than [`MAX_EMPTY_CHUNKS`]
    ///   consecutive empty chunks
    /// - `StreamError::Decode` when a record's type name region is not
    ///   valid UTF-8
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<WireRecord>, StreamError> {
        if chunk.is_empty() {
            self.empty_chunks += 1;
            self.consecutive_empty += 1;
            if self.consecutive_empty > MAX_EMPTY_CHUNKS {
                return Err(StreamError::Stalled {
                    empty_reads: self.consecutive_empty,
                });
            }
            return Ok(Vec::new());
        }

        self.consecutive_empty = 0;
        self.num_chunks += 1;
        self.bytes_read += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        loop {
            match self.state {
                AssemblerState::AwaitingHeader => {
                    if self.buffer.len() < REC_HDR_SIZE {
                        break;
                    }
                    let mut raw = [0u8; REC_HDR_SIZE];
                    raw.copy_from_slice(&self.buffer[..REC_HDR_SIZE]);
                    let header = WireHeader::parse(&raw)?;

                    self.buffer.advance(REC_HDR_SIZE);
                    self.bytes_processed += REC_HDR_SIZE as u64;
                    self.state = AssemblerState::AwaitingRecordBody {
                        type_len: header.type_len,
                        data_len: header.data_len,
                    };
                }
                AssemblerState::AwaitingRecordBody { type_len, data_len } => {
                    let record_size = type_len + data_len;
                    if self.buffer.len() < record_size {
                        break;
                    }

                    let mut body = self.buffer.split_to(record_size).freeze();
                    self.bytes_processed += record_size as u64;

                    let name_region = body.split_to(type_len);
                    // The declared length covers the NUL terminator and
                    // any padding after it; the name ends at the first
                    // NUL.
                    let name_end = name_region
                        .iter()
                        .position(|&b| b == 0)
                        .unwrap_or(type_len.saturating_sub(1));
                    let type_name = std::str::from_utf8(&name_region[..name_end])
                        .map_err(|_| StreamError::Decode(DecodeError::InvalidTypeName))?
                        .to_string();

                    records.push(WireRecord {
                        type_name,
                        data: body,
                    });
                    self.state = AssemblerState::AwaitingHeader;
                }
            }
        }

        Ok(records)
    }

    /// Check for a clean end of stream.
    ///
    /// # Errors
    /// `StreamError::Incomplete` when the transport ended mid-header or
    /// mid-record; a partial record is a reportable condition, not
    /// something to swallow.
    pub fn finish(&self) -> Result<(), StreamError> {
        match self.state {
            AssemblerState::AwaitingHeader if self.buffer.is_empty() => Ok(()),
            AssemblerState::AwaitingHeader => Err(StreamError::Incomplete {
                buffered: self.buffer.len(),
                context: "awaiting header",
            }),
            AssemblerState::AwaitingRecordBody { .. } => Err(StreamError::Incomplete {
                buffered: self.buffer.len(),
                context: "awaiting record body",
            }),
        }
    }

    /// Total data bytes fed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Bytes consumed as complete headers and records.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Data chunks fed so far.
    pub fn num_chunks(&self) -> u64 {
        self.num_chunks
    }

    /// Empty chunks observed so far (cumulative, not just the current
    /// consecutive run).
    pub fn empty_chunks(&self) -> u64 {
        self.empty_chunks
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate result of processing one stream.
#[derive(Debug, Clone, Default)]
pub struct StreamSummary {
    /// Records seen per record type, whether or not a callback handled
    /// them.
    pub record_counts: HashMap<String, u64>,
    /// Total data bytes read from the transport.
    pub bytes_read: u64,
    /// Bytes consumed as complete headers and records.
    pub bytes_processed: u64,
    /// Data chunks received.
    pub num_chunks: u64,
    /// Empty chunks received.
    pub empty_chunks: u64,
    /// Records that decoded fine but had no registered callback.
    pub unhandled_records: u64,
}

impl StreamSummary {
    /// Records seen for one type.
    pub fn count_for(&self, record_type: &str) -> u64 {
        self.record_counts.get(record_type).copied().unwrap_or(0)
    }

    /// Total records seen across all types.
    pub fn total_records(&self) -> u64 {
        self.record_counts.values().sum()
    }
}
