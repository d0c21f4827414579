//! Decoded record values.
//!
//! Records decode into a dynamically typed representation: the wire format
//! is self-describing, so there are no compile-time record structs. A
//! [`DecodedRecord`] keeps its fields in schema declaration order.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One decoded field value.
///
/// Integer widths and signedness are preserved from the wire; 64-bit
/// integers stay integers rather than being widened into `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 8-bit unsigned integer.
    UInt8(u8),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Epoch timestamp decoded from a TIME8 field.
    Time(DateTime<Utc>),
    /// A single character of a string field (intermediate; character
    /// arrays collapse into `String` during field decoding).
    Char(char),
    /// A character array collapsed to its NUL-truncated string.
    String(String),
    /// A nested record.
    Record(DecodedRecord),
    /// An array of elements (fixed-count or fill-remainder fields with
    /// more than one element).
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// The value as a signed 64-bit integer, when it is any integer that
    /// fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int8(v) => Some(*v as i64),
            FieldValue::Int16(v) => Some(*v as i64),
            FieldValue::Int32(v) => Some(*v as i64),
            FieldValue::Int64(v) => Some(*v),
            FieldValue::UInt8(v) => Some(*v as i64),
            FieldValue::UInt16(v) => Some(*v as i64),
            FieldValue::UInt32(v) => Some(*v as i64),
            FieldValue::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// The value as an unsigned 64-bit integer, when it is a non-negative
    /// integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(*v as u64),
            FieldValue::UInt16(v) => Some(*v as u64),
            FieldValue::UInt32(v) => Some(*v as u64),
            FieldValue::UInt64(v) => Some(*v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// The value as a float, when it is a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a string slice, when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a timestamp, when it is one.
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// The value as a nested record, when it is one.
    pub fn as_record(&self) -> Option<&DecodedRecord> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The value as an array, when it is one.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Convert the value to a `serde_json::Value` for serialization.
    ///
    /// Non-finite floats have no JSON representation and become null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int8(v) => Value::Number((*v).into()),
            FieldValue::Int16(v) => Value::Number((*v).into()),
            FieldValue::Int32(v) => Value::Number((*v).into()),
            FieldValue::Int64(v) => Value::Number((*v).into()),
            FieldValue::UInt8(v) => Value::Number((*v).into()),
            FieldValue::UInt16(v) => Value::Number((*v).into()),
            FieldValue::UInt32(v) => Value::Number((*v).into()),
            FieldValue::UInt64(v) => Value::Number((*v).into()),
            FieldValue::Float(v) => serde_json::Number::from_f64(*v as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Time(t) => Value::String(t.to_rfc3339()),
            FieldValue::Char(c) => Value::String(c.to_string()),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Record(r) => r.to_json(),
            FieldValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
        }
    }
}

/// A decoded record: field names mapped to values, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DecodedRecord {
    /// Create an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a decoded field.
    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Number of decoded fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert the record to a JSON object, preserving field order.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accessors() {
        assert_eq!(FieldValue::Int8(-5).as_i64(), Some(-5));
        assert_eq!(FieldValue::UInt64(42).as_i64(), Some(42));
        assert_eq!(FieldValue::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(FieldValue::Int32(-1).as_u64(), None);
        assert_eq!(FieldValue::Double(1.5).as_i64(), None);
    }

    #[test]
    fn test_float_accessor() {
        assert_eq!(FieldValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(FieldValue::Double(2.25).as_f64(), Some(2.25));
        assert_eq!(FieldValue::Int32(1).as_f64(), None);
    }

    #[test]
    fn test_record_get_and_order() {
        let mut record = DecodedRecord::with_capacity(2);
        record.push("cycle", FieldValue::UInt16(3));
        record.push("height", FieldValue::Double(101.25));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("cycle"), Some(&FieldValue::UInt16(3)));
        assert!(record.get("missing").is_none());
        assert_eq!(record.fields()[0].0, "cycle");
        assert_eq!(record.fields()[1].0, "height");
    }

    #[test]
    fn test_to_json() {
        let mut inner = DecodedRecord::with_capacity(1);
        inner.push("v", FieldValue::Int32(7));

        let mut record = DecodedRecord::with_capacity(3);
        record.push("name", FieldValue::String("ab".to_string()));
        record.push("nan", FieldValue::Double(f64::NAN));
        record.push("inner", FieldValue::Record(inner));

        let json = record.to_json();
        assert_eq!(json["name"], "ab");
        assert!(json["nan"].is_null());
        assert_eq!(json["inner"]["v"], 7);
    }
}
