//! Configuration types
//!
//! This module contains the tap configuration (credentials and tuning
//! knobs), the self-describing config specification printed by `spec`,
//! and the catalog types returned by discovery.

use crate::error::{Error, Result};
use crate::types::{OptionStringExt, SyncMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default API root for Zendesk Sell
pub const DEFAULT_BASE_URL: &str = "https://api.getbase.com/v2";

/// Default and maximum number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page the API will serve
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default request rate (the API allows 36,000 requests per hour)
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

// ============================================================================
// Tap Configuration
// ============================================================================

/// Runtime configuration for the tap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// API access token (secret)
    #[serde(default)]
    pub access_token: Option<String>,

    /// Device UUID used by the sync API
    #[serde(default)]
    pub device_uuid: Option<String>,

    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Earliest `updated_at` to emit for incremental streams
    #[serde(default)]
    pub start_date: Option<String>,

    /// API root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Client-side request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Custom user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_requests_per_second() -> u32 {
    DEFAULT_REQUESTS_PER_SECOND
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            device_uuid: None,
            page_size: DEFAULT_PAGE_SIZE,
            start_date: None,
            base_url: default_base_url(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            user_agent: None,
        }
    }
}

impl TapConfig {
    /// Create a config with just an access token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Parse and validate a config from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load and validate a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    /// Validate the configuration, normalizing what can be normalized.
    ///
    /// Runs before any network call so that credential problems surface
    /// as startup errors.
    pub fn validate(mut self) -> Result<Self> {
        self.access_token = self.access_token.none_if_empty();
        if self.access_token.is_none() {
            return Err(Error::missing_field("access_token"));
        }

        self.device_uuid = self.device_uuid.none_if_empty();
        self.start_date = self.start_date.none_if_empty();
        self.user_agent = self.user_agent.none_if_empty();

        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.page_size > MAX_PAGE_SIZE {
            warn!(
                "page_size {} exceeds the API maximum, using {MAX_PAGE_SIZE}",
                self.page_size
            );
            self.page_size = MAX_PAGE_SIZE;
        }

        if self.request_timeout == 0 {
            return Err(Error::invalid_value(
                "request_timeout",
                "must be at least 1 second",
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        if let Some(start) = &self.start_date {
            DateTime::parse_from_rfc3339(start)
                .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;
        }

        Ok(self)
    }

    /// Access token, empty if unset
    pub fn token(&self) -> &str {
        self.access_token.as_deref().unwrap_or_default()
    }

    /// Parsed start date
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

// ============================================================================
// Config Specification
// ============================================================================

/// Self-description of the accepted configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSpec {
    /// Tap name
    pub name: String,

    /// Tap version
    pub version: String,

    /// Accepted options
    pub properties: Vec<PropertySpec>,
}

/// A single configuration option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Option key
    pub name: String,

    /// JSON type of the option
    #[serde(rename = "type")]
    pub property_type: String,

    /// Whether the option must be present
    #[serde(default)]
    pub required: bool,

    /// Whether the value must be masked
    #[serde(default)]
    pub secret: bool,

    /// Display title
    pub title: String,

    /// Description
    pub description: String,
}

impl PropertySpec {
    fn new(name: &str, property_type: &str, title: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            property_type: property_type.to_string(),
            required: false,
            secret: false,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

impl ConfigSpec {
    /// The specification for this tap
    pub fn tap() -> Self {
        Self {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            properties: vec![
                PropertySpec::new(
                    "access_token",
                    "string",
                    "Access Token",
                    "The token to authenticate against the API service",
                )
                .required()
                .secret(),
                PropertySpec::new(
                    "device_uuid",
                    "string",
                    "Device UUID",
                    "The device's universally unique identifier (UUID)",
                ),
                PropertySpec::new(
                    "page_size",
                    "integer",
                    "Page Size",
                    "Records requested per page (1-100)",
                ),
                PropertySpec::new(
                    "start_date",
                    "string",
                    "Start Date",
                    "Earliest updated_at to extract for incremental streams (RFC 3339)",
                ),
                PropertySpec::new("base_url", "string", "Base URL", "API root URL"),
                PropertySpec::new(
                    "request_timeout",
                    "integer",
                    "Request Timeout",
                    "Per-request timeout in seconds",
                ),
                PropertySpec::new(
                    "requests_per_second",
                    "integer",
                    "Requests Per Second",
                    "Client-side rate limit",
                ),
                PropertySpec::new("user_agent", "string", "User Agent", "Custom user agent"),
            ],
        }
    }

    /// Names of the required options
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

impl Catalog {
    /// Find a stream by name
    pub fn get(&self, name: &str) -> Option<&CatalogStream> {
        self.streams.iter().find(|s| s.stream == name)
    }

    /// Stream names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.stream.as_str()).collect()
    }
}

/// Stream in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub stream: String,

    /// Stable stream identifier
    pub tap_stream_id: String,

    /// JSON schema for the stream
    #[serde(default)]
    pub schema: Value,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication (cursor) field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Supported sync modes
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,

    /// Parent stream, for child streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_stream: Option<String>,
}
