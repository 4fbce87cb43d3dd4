//! API envelope types
//!
//! List endpoints answer with `{items: [{data, meta}], meta: {links}}`,
//! single-object endpoints with `{data, meta}`.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// A single list request: a path (or absolute URL) plus query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Path relative to the API root, or a server-issued absolute URL
    pub target: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
}

impl ListRequest {
    /// Create a request for `target` with no parameters
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            query: Vec::new(),
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn extend_query<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(params);
        self
    }
}

/// One page of a list response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Raw response body (`Null` for an empty response)
    pub body: Value,
    /// Records unwrapped from the envelope
    pub records: Vec<Value>,
}

impl ListPage {
    /// Build a page from a response body
    pub fn from_body(body: Value) -> Result<Self> {
        let records = decode_records(&body)?;
        Ok(Self { body, records })
    }

    /// An empty page
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Unwrap records from a response envelope.
///
/// Each `items[*]` entry contributes its `data` object (or itself when it has
/// none). A top-level `data` object is a single record.
pub fn decode_records(body: &Value) -> Result<Vec<Value>> {
    if body.is_null() {
        return Ok(Vec::new());
    }

    if let Some(items) = body.get("items") {
        let items = items
            .as_array()
            .ok_or_else(|| Error::decode("`items` is not an array"))?;
        return Ok(items
            .iter()
            .map(|item| item.get("data").unwrap_or(item).clone())
            .collect());
    }

    match body.get("data") {
        Some(Value::Null) => Ok(Vec::new()),
        Some(data) => Ok(vec![data.clone()]),
        None => Err(Error::decode(
            "Response has neither `items` nor `data`",
        )),
    }
}

/// An open sync session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSession {
    /// Server-issued session id
    pub id: String,
}

impl SyncSession {
    /// Read the session id from a start response (`{data: {id}}` or `{id}`)
    pub fn from_body(body: &Value) -> Option<Self> {
        let id = body
            .pointer("/data/id")
            .or_else(|| body.get("id"))?;

        let id = match id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(Self { id })
    }
}

/// One event delivered by the sync queue
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueueItem {
    /// Event payload
    #[serde(default)]
    pub data: Value,
    /// Event metadata (`type`, `sync.event_type`, `sync.ack_key`, ...)
    #[serde(default)]
    pub meta: Value,
}

impl QueueItem {
    /// Acknowledgment key for this item
    pub fn ack_key(&self) -> Option<&str> {
        self.meta
            .pointer("/sync/ack_key")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The record emitted for this event
    pub fn into_record(self) -> Value {
        json!({ "data": self.data, "meta": self.meta })
    }
}

/// Parse queue items out of a fetch response
pub fn decode_queue(body: &Value) -> Result<Vec<QueueItem>> {
    match body.get("items") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items.clone())
            .map_err(|e| Error::decode(format!("Invalid sync queue items: {e}"))),
    }
}
