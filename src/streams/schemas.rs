//! Static base schemas
//!
//! Field lists follow the Sell API resource reference. Every property is
//! nullable.

use crate::schema::{JsonSchema, SchemaProperty as P};
use std::collections::BTreeMap;

fn timestamps() -> [(&'static str, P); 2] {
    [("created_at", P::date_time()), ("updated_at", P::date_time())]
}

fn with_timestamps<const N: usize>(fields: [(&'static str, P); N]) -> JsonSchema {
    JsonSchema::from_properties(fields.into_iter().chain(timestamps()))
}

fn tag_list() -> P {
    P::array(P::string())
}

fn object_of<const N: usize>(fields: [(&'static str, P); N]) -> P {
    P::object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

pub(super) fn accounts() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("name", P::string()),
        ("currency", P::string()),
        ("time_format", P::string()),
        ("timezone", P::string()),
        ("phone", P::string()),
        ("subdomain", P::string()),
    ])
}

pub(super) fn contacts() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("owner_id", P::integer()),
        ("contact_id", P::integer()),
        ("parent_organization_id", P::integer()),
        ("is_organization", P::boolean()),
        ("name", P::string()),
        ("first_name", P::string()),
        ("last_name", P::string()),
        ("customer_status", P::string()),
        ("prospect_status", P::string()),
        ("title", P::string()),
        ("description", P::string()),
        ("industry", P::string()),
        ("website", P::string()),
        ("email", P::string()),
        ("phone", P::string()),
        ("mobile", P::string()),
        ("fax", P::string()),
        ("twitter", P::string()),
        ("facebook", P::string()),
        ("linkedin", P::string()),
        ("skype", P::string()),
        ("address", P::address()),
        ("billing_address", P::address()),
        ("shipping_address", P::address()),
        ("tags", tag_list()),
        ("custom_fields", P::any_object()),
    ])
}

pub(super) fn deals() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("owner_id", P::integer()),
        ("contact_id", P::integer()),
        ("organization_id", P::integer()),
        ("stage_id", P::integer()),
        ("source_id", P::integer()),
        ("loss_reason_id", P::integer()),
        ("unqualified_reason_id", P::integer()),
        ("last_stage_change_by_id", P::integer()),
        ("name", P::string()),
        ("currency", P::string()),
        ("dropbox_email", P::string()),
        ("value", P::number()),
        ("hot", P::boolean()),
        ("customized_win_likelihood", P::integer()),
        ("estimated_close_date", P::date()),
        ("last_stage_change_at", P::date_time()),
        ("last_activity_at", P::date_time()),
        ("added_at", P::date_time()),
        ("tags", tag_list()),
        ("associated_contacts", P::array(P::any_object())),
        ("custom_fields", P::any_object()),
    ])
}

pub(super) fn associated_contacts() -> JsonSchema {
    with_timestamps([
        ("deal_id", P::integer()),
        ("contact_id", P::integer()),
        ("role", P::string()),
    ])
}

/// Deal and lead sources
pub(super) fn sources() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("name", P::string()),
        ("resource_type", P::string()),
    ])
}

/// Loss and unqualified reasons
pub(super) fn reasons() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("name", P::string()),
    ])
}

pub(super) fn events() -> JsonSchema {
    JsonSchema::from_properties([
        (
            "data",
            object_of([("id", P::integer()), ("updated_at", P::date_time())]),
        ),
        (
            "meta",
            object_of([
                ("type", P::string()),
                (
                    "sync",
                    object_of([
                        ("event_type", P::string()),
                        ("ack_key", P::string()),
                        ("revision", P::integer()),
                    ]),
                ),
            ]),
        ),
    ])
}

pub(super) fn leads() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("owner_id", P::integer()),
        ("source_id", P::integer()),
        ("unqualified_reason_id", P::integer()),
        ("first_name", P::string()),
        ("last_name", P::string()),
        ("organization_name", P::string()),
        ("status", P::string()),
        ("title", P::string()),
        ("description", P::string()),
        ("industry", P::string()),
        ("website", P::string()),
        ("email", P::string()),
        ("phone", P::string()),
        ("mobile", P::string()),
        ("fax", P::string()),
        ("twitter", P::string()),
        ("facebook", P::string()),
        ("linkedin", P::string()),
        ("skype", P::string()),
        ("address", P::address()),
        ("tags", tag_list()),
        ("custom_fields", P::any_object()),
    ])
}

pub(super) fn notes() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("resource_id", P::integer()),
        ("resource_type", P::string()),
        ("content", P::string()),
        ("type", P::string()),
        ("is_important", P::boolean()),
        ("tags", tag_list()),
    ])
}

pub(super) fn orders() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("deal_id", P::integer()),
        ("discount", P::number()),
    ])
}

pub(super) fn line_items() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("order_id", P::integer()),
        ("product_id", P::integer()),
        ("sku", P::string()),
        ("name", P::string()),
        ("description", P::string()),
        ("currency", P::string()),
        ("value", P::number()),
        ("price", P::number()),
        ("variation", P::number()),
        ("quantity", P::integer()),
    ])
}

pub(super) fn pipelines() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("name", P::string()),
        ("disabled", P::boolean()),
    ])
}

pub(super) fn products() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("name", P::string()),
        ("description", P::string()),
        ("sku", P::string()),
        ("active", P::boolean()),
        ("max_discount", P::number()),
        ("max_markup", P::number()),
        ("cost", P::number()),
        ("cost_currency", P::string()),
        (
            "prices",
            P::array(object_of([
                ("amount", P::string()),
                ("currency", P::string()),
            ])),
        ),
    ])
}

pub(super) fn stages() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("pipeline_id", P::integer()),
        ("name", P::string()),
        ("category", P::string()),
        ("position", P::integer()),
        ("likelihood", P::integer()),
        ("active", P::boolean()),
    ])
}

pub(super) fn tags() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("name", P::string()),
        ("resource_type", P::string()),
    ])
}

pub(super) fn tasks() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("owner_id", P::integer()),
        ("resource_id", P::integer()),
        ("resource_type", P::string()),
        ("content", P::string()),
        ("completed", P::boolean()),
        ("overdue", P::boolean()),
        ("due_date", P::date_time()),
        ("remind_at", P::date_time()),
        ("completed_at", P::date_time()),
    ])
}

pub(super) fn text_messages() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("user_id", P::integer()),
        ("resource_id", P::integer()),
        ("resource_type", P::string()),
        ("resource_phone_number", P::string()),
        ("user_phone_number", P::string()),
        ("content", P::string()),
        ("incoming", P::boolean()),
        ("associated_deal_ids", P::array(P::integer())),
        ("sent_at", P::date_time()),
    ])
}

pub(super) fn users() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("reports_to", P::integer()),
        ("name", P::string()),
        ("email", P::string()),
        ("status", P::string()),
        ("role", P::string()),
        ("team_name", P::string()),
        ("timezone", P::string()),
        ("phone_number", P::string()),
        ("invited", P::boolean()),
        ("confirmed", P::boolean()),
        ("roles", P::array(P::any_object())),
        ("deleted_at", P::date_time()),
    ])
}

pub(super) fn visit_outcomes() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("name", P::string()),
    ])
}

pub(super) fn visits() -> JsonSchema {
    with_timestamps([
        ("id", P::integer()),
        ("creator_id", P::integer()),
        ("outcome_id", P::integer()),
        ("resource_id", P::integer()),
        ("resource_type", P::string()),
        ("resource_address", P::string()),
        ("summary", P::string()),
        ("rep_location_verification_status", P::string()),
        ("visited_at", P::date_time()),
    ])
}
