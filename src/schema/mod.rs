//! Schema module
//!
//! JSON Schema values for stream declarations, plus discovery of the
//! tenant-defined custom fields that extend them.
//!
//! Schemas are immutable values built per discovery run: a static base
//! schema composed with the custom field mapping fetched for that run.

mod custom_fields;
mod types;

pub use custom_fields::{
    discover_custom_fields, CustomFieldDefinition, CustomFieldSchema, CustomFieldType,
    FieldConflict, ResourceType, SkippedField,
};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
