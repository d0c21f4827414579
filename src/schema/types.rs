//! Record type system: the primitive type catalog and field/record
//! definitions.
//!
//! Record layouts are not known at compile time. The server describes each
//! record type as a JSON object mapping field names to field definitions,
//! with reserved double-underscore properties carrying metadata about the
//! type itself (notably `__datasize`, the byte size of one instance when the
//! type is embedded in another record).

use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;

/// Wire codes for field types.
///
/// The numeric values are the server's type codes; `User` marks a field
/// whose type names another record definition rather than a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    /// 8-bit signed integer.
    Int8 = 0,
    /// 16-bit signed integer.
    Int16 = 1,
    /// 32-bit signed integer.
    Int32 = 2,
    /// 64-bit signed integer.
    Int64 = 3,
    /// 8-bit unsigned integer.
    UInt8 = 4,
    /// 16-bit unsigned integer.
    UInt16 = 5,
    /// 32-bit unsigned integer.
    UInt32 = 6,
    /// 64-bit unsigned integer.
    UInt64 = 7,
    /// Bit field (declared by the protocol but unsupported by this client).
    Bitfield = 8,
    /// 32-bit IEEE 754 floating-point.
    Float = 9,
    /// 64-bit IEEE 754 floating-point.
    Double = 10,
    /// 8-byte signed microsecond count since the Unix epoch.
    Time8 = 11,
    /// One byte of a character array.
    String = 12,
    /// Nested user-defined record type.
    User = 13,
}

impl TypeCode {
    /// Look up a primitive type by its schema name.
    ///
    /// Returns `None` for anything that is not in the primitive catalog,
    /// which is how user-defined record types are recognized.
    pub fn from_name(name: &str) -> Option<TypeCode> {
        match name {
            "INT8" => Some(TypeCode::Int8),
            "INT16" => Some(TypeCode::Int16),
            "INT32" => Some(TypeCode::Int32),
            "INT64" => Some(TypeCode::Int64),
            "UINT8" => Some(TypeCode::UInt8),
            "UINT16" => Some(TypeCode::UInt16),
            "UINT32" => Some(TypeCode::UInt32),
            "UINT64" => Some(TypeCode::UInt64),
            "BITFIELD" => Some(TypeCode::Bitfield),
            "FLOAT" => Some(TypeCode::Float),
            "DOUBLE" => Some(TypeCode::Double),
            "TIME8" => Some(TypeCode::Time8),
            "STRING" => Some(TypeCode::String),
            "USER" => Some(TypeCode::User),
            _ => None,
        }
    }

    /// Byte size of one element of this type.
    ///
    /// `User` has no intrinsic size; embedded record types take their size
    /// from the nested definition's `__datasize`.
    pub fn size(self) -> usize {
        match self {
            TypeCode::Int8 | TypeCode::UInt8 | TypeCode::Bitfield | TypeCode::String => 1,
            TypeCode::Int16 | TypeCode::UInt16 => 2,
            TypeCode::Int32 | TypeCode::UInt32 | TypeCode::Float => 4,
            TypeCode::Int64 | TypeCode::UInt64 | TypeCode::Double | TypeCode::Time8 => 8,
            TypeCode::User => 0,
        }
    }

    /// Schema name of this type.
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Int8 => "INT8",
            TypeCode::Int16 => "INT16",
            TypeCode::Int32 => "INT32",
            TypeCode::Int64 => "INT64",
            TypeCode::UInt8 => "UINT8",
            TypeCode::UInt16 => "UINT16",
            TypeCode::UInt32 => "UINT32",
            TypeCode::UInt64 => "UINT64",
            TypeCode::Bitfield => "BITFIELD",
            TypeCode::Float => "FLOAT",
            TypeCode::Double => "DOUBLE",
            TypeCode::Time8 => "TIME8",
            TypeCode::String => "STRING",
            TypeCode::User => "USER",
        }
    }
}

/// Layout of a single field within a record's data region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDef {
    /// Primitive type name, or the name of a nested record type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Number of elements; 0 means the field fills the remainder of the
    /// record.
    pub elements: u32,
    /// Bit offset from the start of the record's data region. Always
    /// byte-aligned in practice.
    pub offset: u64,
    /// Flag tokens; contains `BE` when the field is big-endian.
    #[serde(default)]
    pub flags: String,
}

impl FieldDef {
    /// Whether the field's elements are big-endian.
    pub fn is_big_endian(&self) -> bool {
        self.flags.contains("BE")
    }

    /// The field's byte offset within the record's data region.
    pub fn byte_offset(&self) -> usize {
        (self.offset / 8) as usize
    }

    /// The primitive type code, or `User` for nested record types.
    pub fn type_code(&self) -> TypeCode {
        TypeCode::from_name(&self.type_name).unwrap_or(TypeCode::User)
    }
}

/// Prefix marking reserved metadata properties in a record definition.
pub const METADATA_PREFIX: &str = "__";

/// A record type's field layout, as served by the definition endpoint.
///
/// Fields keep their server declaration order: decode order follows it, and
/// the fill-remainder rule is only well-defined for the last declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    type_name: String,
    fields: Vec<(String, FieldDef)>,
    datasize: usize,
}

impl RecordDef {
    /// Parse a record definition from the definition endpoint's JSON.
    ///
    /// Properties whose names start with [`METADATA_PREFIX`] are metadata:
    /// `__datasize` is captured, anything else reserved is ignored. All
    /// other properties must be field definitions.
    ///
    /// # Errors
    /// `SchemaError::Malformed` if the value is not an object or any field
    /// definition does not deserialize.
    pub fn from_json(record_type: &str, value: &Value) -> Result<Self, SchemaError> {
        let map = value.as_object().ok_or_else(|| SchemaError::Malformed {
            record_type: record_type.to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(value)),
        })?;

        let mut fields = Vec::with_capacity(map.len());
        let mut datasize = 0usize;

        for (name, field_value) in map {
            if let Some(meta) = name.strip_prefix(METADATA_PREFIX) {
                if meta == "datasize" {
                    datasize = field_value.as_u64().ok_or_else(|| SchemaError::Malformed {
                        record_type: record_type.to_string(),
                        reason: format!("__datasize is not an integer: {field_value}"),
                    })? as usize;
                }
                continue;
            }

            let def: FieldDef =
                serde_json::from_value(field_value.clone()).map_err(|e| SchemaError::Malformed {
                    record_type: record_type.to_string(),
                    reason: format!("field '{name}': {e}"),
                })?;
            fields.push((name.clone(), def));
        }

        Ok(Self {
            type_name: record_type.to_string(),
            fields,
            datasize,
        })
    }

    /// Build a definition directly from parts. Mainly useful in tests and
    /// for callers that obtain definitions out of band.
    pub fn new(record_type: impl Into<String>, fields: Vec<(String, FieldDef)>, datasize: usize) -> Self {
        Self {
            type_name: record_type.into(),
            fields,
            datasize,
        }
    }

    /// The record type name this definition describes.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order, metadata properties already stripped.
    pub fn fields(&self) -> &[(String, FieldDef)] {
        &self.fields
    }

    /// Byte size of one instance when this type is embedded in another
    /// record (the `__datasize` metadata property; 0 when absent).
    pub fn datasize(&self) -> usize {
        self.datasize
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_code_catalog() {
        assert_eq!(TypeCode::from_name("INT32"), Some(TypeCode::Int32));
        assert_eq!(TypeCode::from_name("TIME8"), Some(TypeCode::Time8));
        assert_eq!(TypeCode::from_name("atl06rec.elevation"), None);

        assert_eq!(TypeCode::Int8.size(), 1);
        assert_eq!(TypeCode::UInt16.size(), 2);
        assert_eq!(TypeCode::Float.size(), 4);
        assert_eq!(TypeCode::Double.size(), 8);
        assert_eq!(TypeCode::Time8.size(), 8);
        assert_eq!(TypeCode::String.size(), 1);
        assert_eq!(TypeCode::User.size(), 0);
    }

    #[test]
    fn test_type_code_values_match_wire_codes() {
        assert_eq!(TypeCode::Int8 as u8, 0);
        assert_eq!(TypeCode::UInt64 as u8, 7);
        assert_eq!(TypeCode::Bitfield as u8, 8);
        assert_eq!(TypeCode::User as u8, 13);
    }

    #[test]
    fn test_type_code_name_round_trip() {
        for code in [
            TypeCode::Int8,
            TypeCode::Int16,
            TypeCode::Int32,
            TypeCode::Int64,
            TypeCode::UInt8,
            TypeCode::UInt16,
            TypeCode::UInt32,
            TypeCode::UInt64,
            TypeCode::Bitfield,
            TypeCode::Float,
            TypeCode::Double,
            TypeCode::Time8,
            TypeCode::String,
            TypeCode::User,
        ] {
            assert_eq!(TypeCode::from_name(code.name()), Some(code));
        }
    }

    #[test]
    fn test_field_def_flags_and_offset() {
        let def = FieldDef {
            type_name: "INT16".to_string(),
            elements: 1,
            offset: 24,
            flags: "BE".to_string(),
        };
        assert!(def.is_big_endian());
        assert_eq!(def.byte_offset(), 3);
        assert_eq!(def.type_code(), TypeCode::Int16);

        let def = FieldDef {
            type_name: "atl06rec.elevation".to_string(),
            elements: 0,
            offset: 64,
            flags: "LE".to_string(),
        };
        assert!(!def.is_big_endian());
        assert_eq!(def.type_code(), TypeCode::User);
    }

    #[test]
    fn test_record_def_from_json() {
        let value = json!({
            "cycle": {"type": "UINT16", "elements": 1, "offset": 0, "flags": "LE"},
            "height": {"type": "DOUBLE", "elements": 1, "offset": 16, "flags": "LE"},
            "__datasize": 10,
            "__rectype": "example"
        });

        let def = RecordDef::from_json("example", &value).unwrap();
        assert_eq!(def.type_name(), "example");
        assert_eq!(def.datasize(), 10);
        assert_eq!(def.fields().len(), 2);
        // Declaration order is preserved and metadata is stripped.
        assert_eq!(def.fields()[0].0, "cycle");
        assert_eq!(def.fields()[1].0, "height");
    }

    #[test]
    fn test_record_def_missing_flags_defaults_empty() {
        let value = json!({
            "count": {"type": "UINT32", "elements": 1, "offset": 0}
        });
        let def = RecordDef::from_json("counter", &value).unwrap();
        assert!(!def.fields()[0].1.is_big_endian());
    }

    #[test]
    fn test_record_def_rejects_non_object() {
        let err = RecordDef::from_json("bad", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_record_def_rejects_bad_field() {
        let value = json!({
            "broken": {"type": "INT32", "offset": 0}
        });
        let err = RecordDef::from_json("bad", &value).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_record_def_rejects_bad_datasize() {
        let value = json!({
            "__datasize": "ten"
        });
        let err = RecordDef::from_json("bad", &value).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }
}
