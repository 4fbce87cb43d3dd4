//! Stream registry
//!
//! Every stream is a [`StreamDescriptor`] value: where to fetch, how to
//! paginate, how records are post-processed and which static schema the
//! stream declares. There is no per-stream code; behavior is composed
//! from the descriptor fields.

mod registry;
mod schemas;
mod transform;

pub use registry::{all, children_of, find, STREAMS};
pub use transform::{coerce_number, post_process};

use crate::config::CatalogStream;
use crate::error::{Error, Result};
use crate::pagination::{NextPageLinkPaginator, PageNumberPaginator, Paginator, SinglePaginator};
use crate::schema::{CustomFieldSchema, JsonSchema, ResourceType};
use crate::types::{Context, JsonValue, SyncMode};

/// How a stream walks its endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `?page=N&per_page=M` until an empty page
    PageNumber,
    /// Follow `meta.links.next_page` until absent
    NextPageLink,
    /// One request returning a single object
    Single,
    /// Start/fetch/ack session protocol
    SyncSession,
}

/// Link from a child stream to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    /// Parent stream name
    pub stream: &'static str,
    /// Context key holding the parent id; also the injected foreign key
    pub key: &'static str,
}

/// Where discovered custom fields land in a stream's schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomFields {
    /// Resource types whose definitions are merged
    pub resource_types: &'static [ResourceType],
    /// Object property the `custom_fields` property is nested under
    pub nested_in: Option<&'static str>,
    /// Description of the `custom_fields` property
    pub description: &'static str,
}

/// Static description of one stream
#[derive(Debug, Clone, Copy)]
pub struct StreamDescriptor {
    /// Stream name
    pub name: &'static str,
    /// Endpoint path; `{key}` placeholders are filled from the context
    pub path: &'static str,
    /// Primary key fields
    pub primary_keys: &'static [&'static str],
    /// Replication (cursor) field for incremental streams
    pub replication_key: Option<&'static str>,
    /// Parent relationship for child streams
    pub parent: Option<ParentLink>,
    /// Key this stream hands to its children, read from each record
    pub child_key: Option<&'static str>,
    /// Pagination strategy
    pub pagination: Pagination,
    /// Fixed query parameters (`sort_by`, `includes`)
    pub query: &'static [(&'static str, &'static str)],
    /// Custom field merge target
    pub custom_fields: Option<CustomFields>,
    /// Fields returned as strings that must be numeric
    pub numeric_fields: &'static [&'static str],
    /// Static base schema
    pub schema: fn() -> JsonSchema,
}

impl StreamDescriptor {
    /// Whether the stream replicates incrementally
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }

    /// Supported sync modes
    pub fn sync_modes(&self) -> Vec<SyncMode> {
        if self.is_incremental() {
            vec![SyncMode::FullRefresh, SyncMode::Incremental]
        } else {
            vec![SyncMode::FullRefresh]
        }
    }

    /// Resource types whose custom fields this stream declares
    pub fn custom_field_types(&self) -> &'static [ResourceType] {
        self.custom_fields.map_or(&[], |c| c.resource_types)
    }

    /// Endpoint path with context values substituted.
    ///
    /// Returns `Ok(None)` when a child stream's parent key is missing from
    /// the context.
    pub fn resolve_path(&self, context: Option<&Context>) -> Result<Option<String>> {
        let Some(parent) = self.parent else {
            return Ok(Some(self.path.to_string()));
        };

        let Some(value) = context.and_then(|c| c.get(parent.key)).filter(|v| !v.is_null())
        else {
            return Ok(None);
        };

        let id = match value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            other => {
                return Err(Error::decode(format!(
                    "Parent key '{}' for {} is not a scalar: {other}",
                    parent.key, self.name
                )))
            }
        };

        Ok(Some(self.path.replace(&format!("{{{}}}", parent.key), &id)))
    }

    /// Fixed query parameters as owned pairs
    pub fn base_query(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    /// Pagination strategy for list streams; `None` for the sync protocol
    pub fn paginator(&self, page_size: u32) -> Option<Box<dyn Paginator>> {
        match self.pagination {
            Pagination::PageNumber => Some(Box::new(PageNumberPaginator::new(page_size))),
            Pagination::NextPageLink => Some(Box::new(NextPageLinkPaginator::new(page_size))),
            Pagination::Single => Some(Box::new(SinglePaginator)),
            Pagination::SyncSession => None,
        }
    }

    /// Context handed to children of `record`
    pub fn child_context(&self, record: &JsonValue) -> Option<Context> {
        let key = self.child_key?;
        let id = record.get("id").filter(|v| !v.is_null())?;
        Some(Context::from([(key.to_string(), id.clone())]))
    }

    /// Declared schema: the static base plus discovered custom fields
    pub fn build_schema(&self, custom: Option<&CustomFieldSchema>) -> JsonSchema {
        let mut schema = (self.schema)();

        let (Some(target), Some(custom)) = (self.custom_fields, custom) else {
            return schema;
        };
        if custom.is_empty() {
            return schema;
        }

        let property = custom.to_property(target.description);
        match target.nested_in {
            None => schema.add_property("custom_fields", property),
            Some(parent) => {
                if let Some(parent) = schema.get_property_mut(parent) {
                    parent
                        .properties
                        .get_or_insert_with(Default::default)
                        .insert("custom_fields".to_string(), property);
                }
            }
        }

        schema
    }

    /// Catalog entry for this stream with the given schema
    pub fn catalog_entry(&self, schema: &JsonSchema) -> CatalogStream {
        CatalogStream {
            stream: self.name.to_string(),
            tap_stream_id: self.name.to_string(),
            schema: schema.to_json(),
            key_properties: self.primary_keys.iter().map(ToString::to_string).collect(),
            replication_key: self.replication_key.map(ToString::to_string),
            supported_sync_modes: self.sync_modes(),
            parent_stream: self.parent.map(|p| p.stream.to_string()),
        }
    }
}
