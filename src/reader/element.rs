//! Primitive element decoding.
//!
//! Decodes exactly one primitive value from a byte buffer at a given
//! offset, honoring the field's declared endianness. Multi-element fields,
//! strings, and nested records are assembled a layer up in field decoding.

use chrono::{DateTime, Utc};

use crate::error::DecodeError;
use crate::schema::TypeCode;

use super::value::FieldValue;

/// TIME8 raw values are microseconds since the Unix epoch; the protocol
/// defines the decoded timestamp as `raw / 1_000_000` interpreted as epoch
/// milliseconds, with truncating integer division.
const TIME8_DIVISOR: i64 = 1_000_000;

/// Copy `N` bytes starting at `offset`, or fail with `UnexpectedEof`.
#[inline]
fn take<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    offset
        .checked_add(N)
        .and_then(|end| buf.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::UnexpectedEof { offset, needed: N })
}

/// Decode one primitive element at `offset`.
///
/// # Errors
/// - `DecodeError::UnsupportedBitfield` for BITFIELD fields (a declared
///   protocol limitation, never silently worked around)
/// - `DecodeError::NotAPrimitive` for USER fields, which must be routed
///   through record decoding
/// - `DecodeError::UnexpectedEof` if the element extends past the buffer
pub fn decode_element(
    code: TypeCode,
    big_endian: bool,
    buf: &[u8],
    offset: usize,
) -> Result<FieldValue, DecodeError> {
    let value = match code {
        TypeCode::Int8 => FieldValue::Int8(take::<1>(buf, offset)?[0] as i8),
        TypeCode::UInt8 => FieldValue::UInt8(take::<1>(buf, offset)?[0]),
        TypeCode::Int16 => {
            let raw = take::<2>(buf, offset)?;
            FieldValue::Int16(if big_endian {
                i16::from_be_bytes(raw)
            } else {
                i16::from_le_bytes(raw)
            })
        }
        TypeCode::UInt16 => {
            let raw = take::<2>(buf, offset)?;
            FieldValue::UInt16(if big_endian {
                u16::from_be_bytes(raw)
            } else {
                u16::from_le_bytes(raw)
            })
        }
        TypeCode::Int32 => {
            let raw = take::<4>(buf, offset)?;
            FieldValue::Int32(if big_endian {
                i32::from_be_bytes(raw)
            } else {
                i32::from_le_bytes(raw)
            })
        }
        TypeCode::UInt32 => {
            let raw = take::<4>(buf, offset)?;
            FieldValue::UInt32(if big_endian {
                u32::from_be_bytes(raw)
            } else {
                u32::from_le_bytes(raw)
            })
        }
        TypeCode::Int64 => {
            let raw = take::<8>(buf, offset)?;
            FieldValue::Int64(if big_endian {
                i64::from_be_bytes(raw)
            } else {
                i64::from_le_bytes(raw)
            })
        }
        TypeCode::UInt64 => {
            let raw = take::<8>(buf, offset)?;
            FieldValue::UInt64(if big_endian {
                u64::from_be_bytes(raw)
            } else {
                u64::from_le_bytes(raw)
            })
        }
        TypeCode::Float => {
            let raw = take::<4>(buf, offset)?;
            FieldValue::Float(if big_endian {
                f32::from_be_bytes(raw)
            } else {
                f32::from_le_bytes(raw)
            })
        }
        TypeCode::Double => {
            let raw = take::<8>(buf, offset)?;
            FieldValue::Double(if big_endian {
                f64::from_be_bytes(raw)
            } else {
                f64::from_le_bytes(raw)
            })
        }
        TypeCode::Time8 => {
            let raw = take::<8>(buf, offset)?;
            let micros = if big_endian {
                i64::from_be_bytes(raw)
            } else {
                i64::from_le_bytes(raw)
            };
            FieldValue::Time(timestamp_from_micros(micros))
        }
        TypeCode::String => FieldValue::Char(take::<1>(buf, offset)?[0] as char),
        TypeCode::Bitfield => return Err(DecodeError::UnsupportedBitfield),
        TypeCode::User => return Err(DecodeError::NotAPrimitive("USER".to_string())),
    };
    Ok(value)
}

/// Convert a raw TIME8 microsecond count into a timestamp.
///
/// Counts outside chrono's representable range clamp to the range ends.
fn timestamp_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(micros / TIME8_DIVISOR).unwrap_or(if micros < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_int8_and_uint8() {
        let buf = [0xFFu8, 0x7F];
        assert_eq!(
            decode_element(TypeCode::Int8, false, &buf, 0).unwrap(),
            FieldValue::Int8(-1)
        );
        assert_eq!(
            decode_element(TypeCode::UInt8, true, &buf, 0).unwrap(),
            FieldValue::UInt8(255)
        );
        assert_eq!(
            decode_element(TypeCode::Int8, false, &buf, 1).unwrap(),
            FieldValue::Int8(127)
        );
    }

    #[test]
    fn test_decode_int16_both_endiannesses() {
        let buf = [0x01u8, 0x02];
        assert_eq!(
            decode_element(TypeCode::Int16, true, &buf, 0).unwrap(),
            FieldValue::Int16(0x0102)
        );
        assert_eq!(
            decode_element(TypeCode::Int16, false, &buf, 0).unwrap(),
            FieldValue::Int16(0x0201)
        );
    }

    #[test]
    fn test_decode_uint32_at_offset() {
        let buf = [0x00u8, 0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(
            decode_element(TypeCode::UInt32, true, &buf, 1).unwrap(),
            FieldValue::UInt32(0xDEAD_BEEF)
        );
    }

    #[test]
    fn test_decode_int64_boundaries() {
        let buf = i64::MIN.to_be_bytes();
        assert_eq!(
            decode_element(TypeCode::Int64, true, &buf, 0).unwrap(),
            FieldValue::Int64(i64::MIN)
        );

        let buf = i64::MAX.to_le_bytes();
        assert_eq!(
            decode_element(TypeCode::Int64, false, &buf, 0).unwrap(),
            FieldValue::Int64(i64::MAX)
        );

        let buf = u64::MAX.to_le_bytes();
        assert_eq!(
            decode_element(TypeCode::UInt64, false, &buf, 0).unwrap(),
            FieldValue::UInt64(u64::MAX)
        );
    }

    #[test]
    fn test_decode_float_and_double() {
        let buf = 1.5f32.to_be_bytes();
        assert_eq!(
            decode_element(TypeCode::Float, true, &buf, 0).unwrap(),
            FieldValue::Float(1.5)
        );

        let buf = (-2.25f64).to_le_bytes();
        assert_eq!(
            decode_element(TypeCode::Double, false, &buf, 0).unwrap(),
            FieldValue::Double(-2.25)
        );
    }

    #[test]
    fn test_decode_double_nan_and_infinity() {
        let buf = f64::NAN.to_le_bytes();
        match decode_element(TypeCode::Double, false, &buf, 0).unwrap() {
            FieldValue::Double(v) => assert!(v.is_nan()),
            other => panic!("expected Double, got {other:?}"),
        }

        let buf = f64::INFINITY.to_be_bytes();
        assert_eq!(
            decode_element(TypeCode::Double, true, &buf, 0).unwrap(),
            FieldValue::Double(f64::INFINITY)
        );
    }

    #[test]
    fn test_decode_time8_truncates() {
        // 1_500_000 microseconds -> 1 (integer division), read as epoch
        // milliseconds.
        let buf = 1_500_000i64.to_le_bytes();
        let value = decode_element(TypeCode::Time8, false, &buf, 0).unwrap();
        assert_eq!(
            value,
            FieldValue::Time(DateTime::from_timestamp_millis(1).unwrap())
        );

        // Negative counts truncate toward zero, not toward negative infinity.
        let buf = (-1_500_000i64).to_be_bytes();
        let value = decode_element(TypeCode::Time8, true, &buf, 0).unwrap();
        assert_eq!(
            value,
            FieldValue::Time(DateTime::from_timestamp_millis(-1).unwrap())
        );
    }

    #[test]
    fn test_decode_string_single_byte() {
        let buf = [b'a', 0x00];
        assert_eq!(
            decode_element(TypeCode::String, false, &buf, 0).unwrap(),
            FieldValue::Char('a')
        );
        assert_eq!(
            decode_element(TypeCode::String, false, &buf, 1).unwrap(),
            FieldValue::Char('\0')
        );
    }

    #[test]
    fn test_decode_bitfield_unsupported() {
        let buf = [0u8; 8];
        assert!(matches!(
            decode_element(TypeCode::Bitfield, false, &buf, 0),
            Err(DecodeError::UnsupportedBitfield)
        ));
    }

    #[test]
    fn test_decode_user_not_a_primitive() {
        let buf = [0u8; 8];
        assert!(matches!(
            decode_element(TypeCode::User, false, &buf, 0),
            Err(DecodeError::NotAPrimitive(_))
        ));
    }

    #[test]
    fn test_decode_past_end_of_buffer() {
        let buf = [0u8; 3];
        assert!(matches!(
            decode_element(TypeCode::Int32, false, &buf, 0),
            Err(DecodeError::UnexpectedEof { offset: 0, needed: 4 })
        ));
        assert!(matches!(
            decode_element(TypeCode::UInt8, false, &buf, 3),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
