//! Record decoding.
//!
//! Records decode synchronously against a [`SchemaSet`] snapshot: all
//! definition fetches happen up front in
//! [`SchemaCache::resolve_closure`](crate::schema::SchemaCache::resolve_closure),
//! so nested record types recurse through plain function calls with no
//! I/O in the decode path. Reserved `__`-prefixed definition properties are
//! stripped when the definition is parsed and never reach decoding.

use crate::error::{DecodeError, SchemaError};
use crate::schema::{SchemaCache, SchemaSet};

use super::field::decode_field;
use super::value::DecodedRecord;

/// Decode one record of `record_type` from `buf`.
///
/// `rec_offset` marks where the record's data region starts in `buf` and
/// `rec_size` where the record's bytes end; nested decodes receive both
/// unchanged, which is what lets a trailing variable-length field size
/// itself against the enclosing record. Fields decode in declaration
/// order; only the last declared field may legally be variable-length.
///
/// # Errors
/// `SchemaError::Unavailable` if `record_type` is not in `schemas`;
/// otherwise propagates the first field decode failure.
pub fn decode_record(
    record_type: &str,
    schemas: &SchemaSet,
    buf: &[u8],
    rec_offset: usize,
    rec_size: usize,
) -> Result<DecodedRecord, DecodeError> {
    let def = schemas
        .get(record_type)
        .ok_or_else(|| SchemaError::Unavailable {
            record_type: record_type.to_string(),
            reason: "not in the resolved definition set".to_string(),
        })?;

    let mut record = DecodedRecord::with_capacity(def.fields().len());
    for (name, field) in def.fields() {
        let value = decode_field(field, schemas, buf, rec_offset, rec_size)?;
        record.push(name.clone(), value);
    }
    Ok(record)
}

/// Decode a single record outside of any stream.
///
/// `data` is the record's data region (the bytes after the type name).
/// Resolves the definition closure through the cache, then decodes.
///
/// # Errors
/// Propagates definition resolution and decode failures.
pub async fn decode_one_record(
    record_type: &str,
    cache: &SchemaCache,
    data: &[u8],
) -> Result<DecodedRecord, DecodeError> {
    let schemas = cache.resolve_closure(record_type).await?;
    decode_record(record_type, &schemas, data, 0, data.len())
}
