//! Tap entry points
//!
//! [`SellTap`] wires configuration, the API client and the stream table
//! together and exposes the operations the CLI calls: spec, check,
//! discover and sync.

use crate::api::{ListRequest, ResourceClient, SellClient};
use crate::config::{Catalog, ConfigSpec, TapConfig};
use crate::engine::{Message, SyncConfig, SyncEngine, SyncStats};
use crate::error::{Error, Result, ResultExt};
use crate::output::MessageSink;
use crate::schema::{discover_custom_fields, CustomFieldSchema, JsonSchema};
use crate::state::StateManager;
use crate::streams::{self, StreamDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Endpoint used to verify credentials
const CHECK_PATH: &str = "/users/self";

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Sync plan
// ============================================================================

/// One top-level stream to read, with the selected children it feeds
#[derive(Debug, Clone)]
struct PlannedStream {
    stream: &'static StreamDescriptor,
    emit: bool,
    children: Vec<&'static StreamDescriptor>,
}

impl PlannedStream {
    /// Streams whose records this entry emits
    fn emitted(&self) -> impl Iterator<Item = &'static StreamDescriptor> + '_ {
        self.emit
            .then_some(self.stream)
            .into_iter()
            .chain(self.children.iter().copied())
    }
}

/// Resolve stream names into a read plan in table order.
///
/// An empty selection reads every stream. Selecting a child without its
/// parent traverses the parent without emitting it.
fn plan(selection: &[String]) -> Result<Vec<PlannedStream>> {
    let mut selected = Vec::new();
    for name in selection {
        let stream =
            streams::find(name).ok_or_else(|| Error::StreamNotFound { stream: name.clone() })?;
        selected.push(stream.name);
    }
    let wanted = |name: &str| selection.is_empty() || selected.iter().any(|s| *s == name);

    Ok(streams::all()
        .iter()
        .filter(|s| s.parent.is_none())
        .filter_map(|stream| {
            let children: Vec<_> = streams::children_of(stream.name)
                .into_iter()
                .filter(|c| wanted(c.name))
                .collect();
            let emit = wanted(stream.name);
            (emit || !children.is_empty()).then(|| PlannedStream {
                stream,
                emit,
                children,
            })
        })
        .collect())
}

// ============================================================================
// Tap
// ============================================================================

/// The Zendesk Sell tap
pub struct SellTap {
    config: TapConfig,
    client: Arc<dyn ResourceClient>,
}

impl SellTap {
    /// Create a tap talking to the configured API.
    ///
    /// Fails on invalid configuration before any request is made.
    pub fn new(config: TapConfig) -> Result<Self> {
        let config = config.validate()?;
        let client = SellClient::new(&config)?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// Create a tap with an injected client
    pub fn with_client(config: TapConfig, client: Arc<dyn ResourceClient>) -> Self {
        Self { config, client }
    }

    /// Configuration in use
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Configuration options accepted by the tap
    pub fn spec() -> ConfigSpec {
        ConfigSpec::tap()
    }

    /// Verify the credentials against the API
    pub async fn check(&self) -> CheckResult {
        match self.client.get_page(&ListRequest::new(CHECK_PATH)).await {
            Ok(page) => {
                let user = page.records.first().and_then(|u| u.get("email")).cloned();
                info!("Connection check succeeded for {user:?}");
                CheckResult::success()
            }
            Err(e) => {
                warn!("Connection check failed: {e}");
                CheckResult::failure(e.to_string())
            }
        }
    }

    /// Declared schema for `stream`, including discovered custom fields
    pub async fn schema_for(&self, stream: &StreamDescriptor) -> Result<JsonSchema> {
        let resource_types = stream.custom_field_types();
        if resource_types.is_empty() {
            return Ok(stream.build_schema(None));
        }

        let custom: CustomFieldSchema =
            discover_custom_fields(&*self.client, resource_types, self.config.page_size).await?;
        if !custom.conflicts.is_empty() {
            warn!(
                "{} custom field conflicts while building {} schema",
                custom.conflicts.len(),
                stream.name
            );
        }
        Ok(stream.build_schema(Some(&custom)))
    }

    /// Describe every stream
    pub async fn discover(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        for stream in streams::all() {
            let schema = self.schema_for(stream).await?;
            catalog.streams.push(stream.catalog_entry(&schema));
        }
        info!("Discovered {} streams", catalog.streams.len());
        Ok(catalog)
    }

    /// Read the selected streams (all when `selection` is empty).
    ///
    /// A failing stream is logged and the run continues with the next one;
    /// the failures are reported together once every stream has run. The
    /// final state is emitted and saved in every case.
    pub async fn sync(
        &self,
        selection: &[String],
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let plan = plan(selection)?;
        let start = Instant::now();

        let mut config = SyncConfig::new().with_page_size(self.config.page_size);
        if let Some(start_date) = self.config.start_date() {
            config = config.with_start_date(start_date);
        }
        if let Some(device_uuid) = &self.config.device_uuid {
            config = config.with_device_uuid(device_uuid.clone());
        }

        let mut engine = SyncEngine::new(Arc::clone(&self.client), state).with_config(config);
        let mut failed = Vec::new();

        for entry in &plan {
            if let Err(e) = self.sync_entry(&mut engine, entry, sink).await {
                error!("Stream {} failed: {e}", entry.stream.name);
                engine.stats_mut().add_error();
                failed.extend(entry.emitted().map(|s| s.name.to_string()));
            }
        }

        engine.emit_state(sink).await?;
        sink.flush()?;

        let mut stats = engine.stats().clone();
        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Sync finished: {} records from {} streams, {} failed",
            stats.records_synced,
            stats.streams_synced,
            failed.len()
        );

        if failed.is_empty() {
            Ok(stats)
        } else {
            Err(Error::StreamsFailed { streams: failed })
        }
    }

    async fn sync_entry(
        &self,
        engine: &mut SyncEngine,
        entry: &PlannedStream,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        for stream in entry.emitted() {
            let schema = self
                .schema_for(stream)
                .await
                .with_context(|| format!("Failed to build schema for {}", stream.name))?;
            sink.emit(Message::schema(
                stream.name,
                schema.to_json(),
                stream.primary_keys.iter().map(ToString::to_string).collect(),
                stream.replication_key.map(ToString::to_string).into_iter().collect(),
            ))?;
        }

        engine
            .sync_stream(entry.stream, entry.emit, &entry.children, sink)
            .await?;
        Ok(())
    }
}
