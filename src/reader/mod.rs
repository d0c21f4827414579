//! Record stream reader components
//!
//! This module provides the core decoding functionality for the record
//! stream: header parsing, chunk reassembly, and binary decoding of
//! elements, fields, and whole records.

mod assembler;
mod columns;
mod element;
mod field;
mod header;
mod record;
mod value;

pub use assembler::{StreamAssembler, StreamSummary, WireRecord, MAX_EMPTY_CHUNKS};
pub use columns::decode_column;
pub use element::decode_element;
pub use field::decode_field;
pub use header::{WireHeader, REC_HDR_SIZE, REC_VERSION};
pub use record::{decode_one_record, decode_record};
pub use value::{DecodedRecord, FieldValue};
