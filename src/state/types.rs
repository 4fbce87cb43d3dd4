//! State types for tracking sync progress
//!
//! Serialized as the `value` of STATE messages and persisted between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Get the replication bookmark for a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&str> {
        self.bookmarks.get(stream)?.replication_key_value.as_deref()
    }

    /// Set the replication bookmark for a stream
    pub fn set_bookmark(&mut self, stream: &str, key: &str, value: String) {
        let entry = self.get_stream_mut(stream);
        entry.replication_key = Some(key.to_string());
        entry.replication_key_value = Some(value);
    }

    /// Get the persisted device identifier for a stream
    pub fn get_device_uuid(&self, stream: &str) -> Option<&str> {
        self.bookmarks
            .get(stream)?
            .device_uuid
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    /// Persist the device identifier for a stream
    pub fn set_device_uuid(&mut self, stream: &str, device_uuid: String) {
        self.get_stream_mut(stream).device_uuid = Some(device_uuid);
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Field the bookmark refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Newest replication value seen so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<String>,

    /// Device identity used by the sync protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_uuid: Option<String>,
}
