//! Record type definitions and resolution.
//!
//! This module defines the primitive type catalog, the field/record
//! definition structures served by the definition endpoint, and the
//! process-wide definition cache with its resolution snapshot.

mod registry;
mod types;

pub use registry::{DefinitionSource, SchemaCache, SchemaSet};
pub use types::{FieldDef, RecordDef, TypeCode, METADATA_PREFIX};
