//! Error types for record stream decoding

use thiserror::Error;

/// Errors that can occur while resolving record definitions
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The definition service failed or returned an unusable response
    #[error("definition for '{record_type}' unavailable: {reason}")]
    Unavailable {
        /// The record type whose definition was requested
        record_type: String,
        /// What went wrong with the fetch
        reason: String,
    },
    /// The definition JSON does not describe a valid record layout
    #[error("malformed definition for '{record_type}': {reason}")]
    Malformed {
        /// The record type whose definition was being parsed
        record_type: String,
        /// What part of the definition was unusable
        reason: String,
    },
}

/// Errors that can occur while decoding record bytes
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Bit fields are a declared protocol limitation
    #[error("bit fields are unsupported")]
    UnsupportedBitfield,
    /// A record-typed field reached the primitive element decoder
    #[error("user-defined type '{0}' cannot be decoded as a primitive")]
    NotAPrimitive(String),
    /// The field names a type that is neither primitive nor a known record
    #[error("invalid field type '{0}'")]
    InvalidFieldType(String),
    /// A decode ran past the end of the record's data region
    #[error("unexpected end of record data at offset {offset} (need {needed} bytes)")]
    UnexpectedEof {
        /// Byte offset the read started at
        offset: usize,
        /// Bytes the element required
        needed: usize,
    },
    /// The record's type name region is not valid UTF-8
    #[error("record type name is not valid UTF-8")]
    InvalidTypeName,
    /// Definition resolution failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors that can occur while reassembling and processing a record stream
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream's record format version is not the supported one
    #[error("unsupported record format version {found} (expected {expected})")]
    VersionMismatch {
        /// Version the stream declared
        found: u16,
        /// Version this client speaks
        expected: u16,
    },
    /// Too many consecutive empty reads from the transport
    #[error("stream stalled after {empty_reads} consecutive empty reads")]
    Stalled {
        /// Consecutive empty reads observed
        empty_reads: u32,
    },
    /// The transport ended mid-header or mid-record
    #[error("stream ended with {buffered} unconsumed bytes ({context})")]
    Incomplete {
        /// Bytes left in the reassembly buffer
        buffered: usize,
        /// Which state the assembler was in
        context: &'static str,
    },
    /// A record failed to decode; record boundaries cannot be resynchronized
    #[error("record decode failed: {0}")]
    Decode(#[from] DecodeError),
    /// The transport itself failed mid-stream
    #[error("transport error: {0}")]
    Transport(String),
}

/// Top-level client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure from the HTTP layer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status
    #[error("HTTP error {status} from {url}")]
    Http {
        /// Response status code
        status: u16,
        /// Request URL
        url: String,
    },
    /// The response content type matches neither the binary nor the JSON path
    #[error("unexpected content type {0:?}")]
    UnexpectedContentType(Option<String>),
    /// A JSON response body failed to parse
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
    /// Stream reassembly or record decoding failed
    #[error(transparent)]
    Stream(#[from] StreamError),
}
