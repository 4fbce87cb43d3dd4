//! Custom field discovery
//!
//! Tenants attach custom fields to deals, contacts, leads and
//! prospects/customers. Their definitions are fetched from
//! `GET /{resource_type}/custom_fields` and folded into one
//! `name -> shape` mapping.
//!
//! When a name is declared twice with different shapes the first shape
//! wins and the conflict is logged and recorded. Unknown type codes are
//! skipped with a warning.

use super::types::SchemaProperty;
use crate::api::{ListRequest, ResourceClient};
use crate::engine::RecordPager;
use crate::error::{Error, Result};
use crate::pagination::PageNumberPaginator;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// Resource types
// ============================================================================

/// Resource types that carry custom fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Deal,
    Contact,
    Lead,
    ProspectAndCustomer,
}

impl ResourceType {
    /// Every resource type, in discovery order
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Deal,
        ResourceType::Contact,
        ResourceType::Lead,
        ResourceType::ProspectAndCustomer,
    ];

    /// API name of the resource type
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Deal => "deal",
            ResourceType::Contact => "contact",
            ResourceType::Lead => "lead",
            ResourceType::ProspectAndCustomer => "prospect_and_customer",
        }
    }

    /// Path of the custom field definition endpoint
    pub fn custom_fields_path(self) -> String {
        format!("/{}/custom_fields", self.as_str())
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Field types
// ============================================================================

/// Declared type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFieldType {
    Address,
    Bool,
    Date,
    DateTime,
    Email,
    List,
    MultiSelectList,
    Number,
    Phone,
    String,
    Text,
    Url,
}

impl CustomFieldType {
    /// API code of the type
    pub fn as_str(self) -> &'static str {
        match self {
            CustomFieldType::Address => "address",
            CustomFieldType::Bool => "bool",
            CustomFieldType::Date => "date",
            CustomFieldType::DateTime => "datetime",
            CustomFieldType::Email => "email",
            CustomFieldType::List => "list",
            CustomFieldType::MultiSelectList => "multi_select_list",
            CustomFieldType::Number => "number",
            CustomFieldType::Phone => "phone",
            CustomFieldType::String => "string",
            CustomFieldType::Text => "text",
            CustomFieldType::Url => "url",
        }
    }

    /// Schema shape for values of this type.
    ///
    /// `number` values arrive as strings and are declared as such.
    pub fn to_property(self) -> SchemaProperty {
        match self {
            CustomFieldType::Address => SchemaProperty::address(),
            CustomFieldType::Bool => SchemaProperty::boolean(),
            CustomFieldType::Date => SchemaProperty::date(),
            CustomFieldType::DateTime => SchemaProperty::date_time(),
            CustomFieldType::Email => SchemaProperty::string().with_format("email"),
            CustomFieldType::Url => SchemaProperty::string().with_format("uri"),
            CustomFieldType::MultiSelectList => {
                SchemaProperty::array(SchemaProperty::string())
            }
            CustomFieldType::List
            | CustomFieldType::Number
            | CustomFieldType::Phone
            | CustomFieldType::String
            | CustomFieldType::Text => SchemaProperty::string(),
        }
    }
}

impl FromStr for CustomFieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = match s {
            "address" => CustomFieldType::Address,
            "bool" => CustomFieldType::Bool,
            "date" => CustomFieldType::Date,
            "datetime" => CustomFieldType::DateTime,
            "email" => CustomFieldType::Email,
            "list" => CustomFieldType::List,
            "multi_select_list" => CustomFieldType::MultiSelectList,
            "number" => CustomFieldType::Number,
            "phone" => CustomFieldType::Phone,
            "string" => CustomFieldType::String,
            "text" => CustomFieldType::Text,
            "url" => CustomFieldType::Url,
            other => return Err(Error::schema(format!("Unknown custom field type: {other}"))),
        };
        Ok(t)
    }
}

impl std::fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Definitions and merged schema
// ============================================================================

/// A custom field definition as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomFieldDefinition {
    /// Field name (the key used in `custom_fields`)
    pub name: String,
    /// Declared type code
    #[serde(rename = "type")]
    pub field_type: String,
}

impl CustomFieldDefinition {
    /// Create a definition
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// A name declared with two different shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    /// Field name
    pub name: String,
    /// Type that was kept
    pub kept: CustomFieldType,
    /// Resource type the kept definition came from
    pub kept_from: ResourceType,
    /// Type that was dropped
    pub rejected: CustomFieldType,
    /// Resource type the dropped definition came from
    pub rejected_from: ResourceType,
}

/// A definition skipped because its type is unknown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    /// Field name
    pub name: String,
    /// Unrecognized type code
    pub field_type: String,
    /// Resource type declaring it
    pub resource_type: ResourceType,
}

/// Merged custom field mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldSchema {
    /// Resolved shape per field name
    pub properties: BTreeMap<String, SchemaProperty>,
    /// First declaration per field name
    origins: BTreeMap<String, (ResourceType, CustomFieldType)>,
    /// Conflicting redeclarations, in the order they were seen
    pub conflicts: Vec<FieldConflict>,
    /// Definitions with unknown types
    pub skipped: Vec<SkippedField>,
}

impl CustomFieldSchema {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no field was resolved
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Fold definitions of one resource type into the mapping
    pub fn merge<I>(&mut self, resource_type: ResourceType, definitions: I)
    where
        I: IntoIterator<Item = CustomFieldDefinition>,
    {
        for definition in definitions {
            let field_type = match definition.field_type.parse::<CustomFieldType>() {
                Ok(t) => t,
                Err(_) => {
                    warn!(
                        "Skipping custom field '{}' of {resource_type}: unsupported type '{}'",
                        definition.name, definition.field_type
                    );
                    self.skipped.push(SkippedField {
                        name: definition.name,
                        field_type: definition.field_type,
                        resource_type,
                    });
                    continue;
                }
            };

            let shape = field_type.to_property();
            match self.properties.get(&definition.name) {
                None => {
                    self.origins
                        .insert(definition.name.clone(), (resource_type, field_type));
                    self.properties.insert(definition.name, shape);
                }
                Some(existing) if *existing == shape => {}
                Some(_) => {
                    let (kept_from, kept) = self.origins[&definition.name];
                    warn!(
                        "Custom field '{}' is {kept} on {kept_from} but {field_type} on {resource_type}; keeping {kept}",
                        definition.name
                    );
                    self.conflicts.push(FieldConflict {
                        name: definition.name,
                        kept,
                        kept_from,
                        rejected: field_type,
                        rejected_from: resource_type,
                    });
                }
            }
        }
    }

    /// The `custom_fields` object property
    pub fn to_property(&self, description: &str) -> SchemaProperty {
        SchemaProperty::object(self.properties.clone()).with_description(description)
    }
}

/// Fetch and merge custom field definitions for `resource_types`, in order
pub async fn discover_custom_fields(
    client: &dyn ResourceClient,
    resource_types: &[ResourceType],
    page_size: u32,
) -> Result<CustomFieldSchema> {
    let mut schema = CustomFieldSchema::new();

    for &resource_type in resource_types {
        let pager = RecordPager::new(
            client,
            ListRequest::new(resource_type.custom_fields_path()),
            Box::new(PageNumberPaginator::new(page_size)),
        );
        let records = pager.into_stream();
        futures::pin_mut!(records);

        let mut definitions = Vec::new();
        while let Some(record) = records.try_next().await? {
            match serde_json::from_value::<CustomFieldDefinition>(record) {
                Ok(definition) => definitions.push(definition),
                Err(e) => warn!("Ignoring malformed {resource_type} custom field: {e}"),
            }
        }

        debug!(
            "Fetched {} custom field definitions for {resource_type}",
            definitions.len()
        );
        schema.merge(resource_type, definitions);
    }

    Ok(schema)
}
