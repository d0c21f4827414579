//! Field decoding.
//!
//! A field is an array of elements: primitives decoded in place, or nested
//! records decoded recursively. Single-element arrays collapse to scalars
//! and character arrays collapse to NUL-truncated strings. A declared
//! element count of zero means the field consumes every remaining byte of
//! the record (the wire format's variable-length trailing-field mechanism).

use tracing::warn;

use crate::error::{DecodeError, SchemaError};
use crate::schema::{FieldDef, SchemaSet, TypeCode};

use super::element::decode_element;
use super::record::decode_record;
use super::value::FieldValue;

/// Decode one field of a record.
///
/// `rec_offset` is the byte offset of the record's data region within
/// `buf`, and `rec_size` the end of that record's bytes in `buf`; the
/// field's own bit offset is relative to the data region. Both are passed
/// through unchanged to nested record decodes so that trailing
/// variable-length fields size themselves against the enclosing record.
///
/// # Errors
/// Propagates element decode failures; fails with `SchemaError::Malformed`
/// when a nested record type carries no usable `__datasize`.
pub fn decode_field(
    field: &FieldDef,
    schemas: &SchemaSet,
    buf: &[u8],
    rec_offset: usize,
    rec_size: usize,
) -> Result<FieldValue, DecodeError> {
    let big_endian = field.is_big_endian();
    let mut byte_offset = rec_offset + field.byte_offset();
    let code = field.type_code();

    let element_size = match code {
        TypeCode::User => nested_datasize(field, schemas)?,
        _ => code.size(),
    };

    let mut count = field.elements as usize;
    if count == 0 {
        // Variable-length trailing field: the element count is derived
        // from whatever is left of the record.
        let remaining = rec_size.saturating_sub(byte_offset);
        let remainder = remaining % element_size;
        if remainder != 0 {
            warn!(
                field_type = %field.type_name,
                remaining,
                element_size,
                remainder,
                "trailing field does not divide the record evenly; dropping the fractional tail"
            );
        }
        count = remaining / element_size;
    }

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let value = match code {
            TypeCode::User => FieldValue::Record(decode_record(
                &field.type_name,
                schemas,
                buf,
                byte_offset,
                rec_size,
            )?),
            _ => decode_element(code, big_endian, buf, byte_offset)?,
        };
        values.push(value);
        byte_offset += element_size;
    }

    // Character arrays become a single string, cut at the first NUL; the
    // terminator and anything after it are wire padding, not data.
    if code == TypeCode::String {
        let mut text = String::with_capacity(values.len());
        for value in values {
            if let FieldValue::Char(c) = value {
                text.push(c);
            }
        }
        if let Some(nul) = text.find('\0') {
            text.truncate(nul);
        }
        return Ok(FieldValue::String(text));
    }

    if count == 1 {
        if let Some(value) = values.pop() {
            return Ok(value);
        }
    }

    Ok(FieldValue::Array(values))
}

/// Element size of a nested record type, from its resolved `__datasize`.
fn nested_datasize(field: &FieldDef, schemas: &SchemaSet) -> Result<usize, DecodeError> {
    let def = schemas
        .get(&field.type_name)
        .ok_or_else(|| SchemaError::Unavailable {
            record_type: field.type_name.clone(),
            reason: "not in the resolved definition set".to_string(),
        })?;

    if def.datasize() == 0 {
        return Err(SchemaError::Malformed {
            record_type: field.type_name.clone(),
            reason: "embedded record type has no __datasize".to_string(),
        }
        .into());
    }
    Ok(def.datasize())
}
