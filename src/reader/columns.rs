//! Bulk column decoding.
//!
//! Consumers that persist decoded records often get a field's elements
//! back as one packed little-endian byte array per column. This splits
//! such an array into typed values without needing a record definition.

use crate::error::DecodeError;
use crate::schema::TypeCode;

use super::element::decode_element;
use super::value::FieldValue;

/// Decode a packed little-endian byte array into elements of one
/// primitive type.
///
/// A `String` column yields the whole byte run as a single string value;
/// `Time8` columns yield the raw microsecond counts as 64-bit integers
/// rather than timestamps. A byte length that does not divide evenly by
/// the element size fails on the trailing partial element.
///
/// # Errors
/// - `DecodeError::UnsupportedBitfield` / `DecodeError::NotAPrimitive`
///   for types with no packed-column representation
/// - `DecodeError::UnexpectedEof` on a trailing partial element
pub fn decode_column(bytes: &[u8], code: TypeCode) -> Result<Vec<FieldValue>, DecodeError> {
    match code {
        TypeCode::Bitfield => Err(DecodeError::UnsupportedBitfield),
        TypeCode::User => Err(DecodeError::NotAPrimitive("USER".to_string())),
        TypeCode::String => {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            Ok(vec![FieldValue::String(text)])
        }
        TypeCode::Time8 => {
            let mut values = Vec::with_capacity(bytes.len() / 8);
            let mut offset = 0;
            while offset < bytes.len() {
                if let FieldValue::Int64(raw) =
                    decode_element(TypeCode::Int64, false, bytes, offset)?
                {
                    values.push(FieldValue::Int64(raw));
                }
                offset += 8;
            }
            Ok(values)
        }
        _ => {
            let size = code.size();
            let mut values = Vec::with_capacity(bytes.len() / size);
            let mut offset = 0;
            while offset < bytes.len() {
                values.push(decode_element(code, false, bytes, offset)?);
                offset += size;
            }
            Ok(values)
        }
    }
}
