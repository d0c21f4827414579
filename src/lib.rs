//! Streaming binary record client for SlideRule services
//!
//! This library speaks the service's self-describing record stream: an
//! HTTP response body carrying back-to-back binary records, each prefixed
//! by an 8-byte header and a NUL-terminated type name. Record layouts are
//! data, not compile-time structure: they are fetched from the service's
//! `definition` API on first reference and cached for the life of the
//! process.
//!
//! The pipeline runs transport → reassembly → decode → dispatch:
//! chunks of any size feed a [`StreamAssembler`], complete records decode
//! against their resolved definitions, and each decoded record is handed
//! to the callback registered for its type name.
//!
//! ```no_run
//! use serde_json::json;
//! use sliderule_stream::{Callbacks, ClientConfig, SlideruleClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SlideruleClient::new(ClientConfig::new())?;
//!
//! let mut callbacks = Callbacks::new().on("atl06rec", |record| {
//!     println!("elevation record: {}", record.to_json());
//! });
//!
//! let parms = json!({ "parms": { "asset": "icesat2" } });
//! let summary = client
//!     .source_stream("atl06p", Some(&parms), &mut callbacks)
//!     .await?;
//! println!("{} records in {} chunks", summary.total_records(), summary.num_chunks);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod reader;
pub mod schema;

// Re-export main types
pub use client::{process_stream, Callbacks, ClientConfig, RecordHandler, SlideruleClient};
pub use error::{ClientError, DecodeError, SchemaError, StreamError};
pub use reader::{
    decode_column, decode_element, decode_field, decode_one_record, decode_record, DecodedRecord,
    FieldValue, StreamAssembler, StreamSummary, WireHeader, WireRecord, MAX_EMPTY_CHUNKS,
    REC_HDR_SIZE, REC_VERSION,
};
pub use schema::{
    DefinitionSource, FieldDef, RecordDef, SchemaCache, SchemaSet, TypeCode, METADATA_PREFIX,
};
