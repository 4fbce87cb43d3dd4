//! The stream table

use super::schemas;
use super::{CustomFields, Pagination, ParentLink, StreamDescriptor};
use crate::schema::{JsonSchema, ResourceType};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const ID: &[&str] = &["id"];
const SORT_BY_ID: &[(&str, &str)] = &[("sort_by", "id")];
const SORT_BY_UPDATED: &[(&str, &str)] = &[("sort_by", "updated_at")];

/// A plain page-number list stream keyed on `id`
const fn list(
    name: &'static str,
    path: &'static str,
    schema: fn() -> JsonSchema,
) -> StreamDescriptor {
    StreamDescriptor {
        name,
        path,
        primary_keys: ID,
        replication_key: None,
        parent: None,
        child_key: None,
        pagination: Pagination::PageNumber,
        query: SORT_BY_ID,
        custom_fields: None,
        numeric_fields: &[],
        schema,
    }
}

/// A list stream that follows server-issued `next_page` links
const fn linked(
    name: &'static str,
    path: &'static str,
    schema: fn() -> JsonSchema,
) -> StreamDescriptor {
    StreamDescriptor {
        pagination: Pagination::NextPageLink,
        query: &[],
        ..list(name, path, schema)
    }
}

/// All streams, in emission order
pub static STREAMS: &[StreamDescriptor] = &[
    StreamDescriptor {
        pagination: Pagination::Single,
        query: &[],
        ..list("accounts", "/accounts/self", schemas::accounts)
    },
    StreamDescriptor {
        replication_key: Some("updated_at"),
        custom_fields: Some(CustomFields {
            resource_types: &[ResourceType::Contact],
            nested_in: None,
            description: "Custom fields attached to a contact.",
        }),
        ..list("contacts", "/contacts", schemas::contacts)
    },
    StreamDescriptor {
        replication_key: Some("updated_at"),
        child_key: Some("deal_id"),
        query: &[("sort_by", "id"), ("includes", "associated_contacts")],
        custom_fields: Some(CustomFields {
            resource_types: &[ResourceType::Deal],
            nested_in: None,
            description: "Custom fields attached to a deal.",
        }),
        numeric_fields: &["value"],
        ..list("deals", "/deals", schemas::deals)
    },
    StreamDescriptor {
        primary_keys: &["deal_id", "contact_id"],
        parent: Some(ParentLink {
            stream: "deals",
            key: "deal_id",
        }),
        query: &[],
        ..list(
            "associated_contacts",
            "/deals/{deal_id}/associated_contacts",
            schemas::associated_contacts,
        )
    },
    list("deal_sources", "/deal_sources", schemas::sources),
    list(
        "deal_unqualified_reasons",
        "/deal_unqualified_reasons",
        schemas::reasons,
    ),
    StreamDescriptor {
        primary_keys: &[],
        pagination: Pagination::SyncSession,
        query: &[],
        custom_fields: Some(CustomFields {
            resource_types: &ResourceType::ALL,
            nested_in: Some("data"),
            description: "Custom fields attached to an event.",
        }),
        ..list("events", "/sync", schemas::events)
    },
    list("lead_sources", "/lead_sources", schemas::sources),
    list(
        "lead_unqualified_reasons",
        "/lead_unqualified_reasons",
        schemas::reasons,
    ),
    StreamDescriptor {
        replication_key: Some("updated_at"),
        custom_fields: Some(CustomFields {
            resource_types: &[ResourceType::Lead],
            nested_in: None,
            description: "Custom fields attached to a lead.",
        }),
        ..list("leads", "/leads", schemas::leads)
    },
    list("loss_reasons", "/loss_reasons", schemas::reasons),
    linked("notes", "/notes", schemas::notes),
    StreamDescriptor {
        replication_key: Some("updated_at"),
        child_key: Some("order_id"),
        numeric_fields: &["discount"],
        ..list("orders", "/orders", schemas::orders)
    },
    StreamDescriptor {
        parent: Some(ParentLink {
            stream: "orders",
            key: "order_id",
        }),
        query: SORT_BY_UPDATED,
        numeric_fields: &["value", "price", "variation"],
        ..list(
            "line_items",
            "/orders/{order_id}/line_items",
            schemas::line_items,
        )
    },
    list("pipelines", "/pipelines", schemas::pipelines),
    StreamDescriptor {
        numeric_fields: &["cost", "max_discount", "max_markup"],
        ..list("products", "/products", schemas::products)
    },
    list("stages", "/stages", schemas::stages),
    linked("tags", "/tags", schemas::tags),
    StreamDescriptor {
        query: SORT_BY_UPDATED,
        ..linked("tasks", "/tasks", schemas::tasks)
    },
    linked("text_messages", "/text_messages", schemas::text_messages),
    list("users", "/users", schemas::users),
    linked("visit_outcomes", "/visit_outcomes", schemas::visit_outcomes),
    linked("visits", "/visits", schemas::visits),
];

static INDEX: Lazy<HashMap<&'static str, &'static StreamDescriptor>> =
    Lazy::new(|| STREAMS.iter().map(|s| (s.name, s)).collect());

/// All stream descriptors
pub fn all() -> &'static [StreamDescriptor] {
    STREAMS
}

/// Look up a stream by name
pub fn find(name: &str) -> Option<&'static StreamDescriptor> {
    INDEX.get(name).copied()
}

/// Streams whose parent is `name`
pub fn children_of(name: &str) -> Vec<&'static StreamDescriptor> {
    STREAMS
        .iter()
        .filter(|s| s.parent.is_some_and(|p| p.stream == name))
        .collect()
}
