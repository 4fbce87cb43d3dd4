//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Reads streams one at a time and emits their records
//! - `RecordPager` - Drives a pagination strategy against the API
//! - `Message` - Output messages (Schema, Record, State)
//!
//! Requests are awaited one after another. Child streams are read once per
//! parent record, after that record has been emitted.

mod pager;
mod types;

pub use pager::RecordPager;
pub use types::{Message, SyncConfig, SyncStats};

use crate::api::{ListRequest, ResourceClient};
use crate::error::{Error, Result};
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::streams::{post_process, Pagination, StreamDescriptor};
use crate::sync::{resolve_device_uuid, EventSynchronizer, EVENTS_STREAM};
use crate::types::{Context, JsonValue};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// API client
    client: Arc<dyn ResourceClient>,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: Arc<dyn ResourceClient>, state: StateManager) -> Self {
        Self {
            client,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Mutable statistics
    pub fn stats_mut(&mut self) -> &mut SyncStats {
        &mut self.stats
    }

    /// Sync a top-level stream.
    ///
    /// With `emit_records` false the stream is only traversed to feed
    /// `children`. Returns the number of records emitted across the stream
    /// and its children.
    pub async fn sync_stream(
        &mut self,
        stream: &'static StreamDescriptor,
        emit_records: bool,
        children: &[&'static StreamDescriptor],
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let start = Instant::now();
        info!("Starting sync for stream: {}", stream.name);

        let emitted = match stream.pagination {
            Pagination::SyncSession => self.sync_events(stream, sink).await?,
            _ => self.sync_list(stream, emit_records, children, sink).await?,
        };

        self.stats.add_stream();
        self.emit_state(sink).await?;
        self.stats
            .set_duration(self.stats.duration_ms + start.elapsed().as_millis() as u64);

        info!("Completed sync for {}: {emitted} records", stream.name);
        Ok(emitted)
    }

    async fn sync_list(
        &mut self,
        stream: &'static StreamDescriptor,
        emit_records: bool,
        children: &[&'static StreamDescriptor],
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let client = Arc::clone(&self.client);
        let Some(path) = stream.resolve_path(None)? else {
            return Err(Error::config(format!(
                "Stream '{}' needs a parent context",
                stream.name
            )));
        };
        let paginator = stream.paginator(self.config.page_size).ok_or_else(|| {
            Error::config(format!("Stream '{}' is not a list endpoint", stream.name))
        })?;

        let mut bookmark = if emit_records {
            self.bookmark_for(stream).await
        } else {
            None
        };

        let request = ListRequest::new(path).extend_query(stream.base_query());
        let mut pager = RecordPager::new(&*client, request, paginator);
        let mut emitted = 0;

        while let Some(records) = pager.next_page().await? {
            for record in records {
                let record = post_process(stream, record, None);
                let context = stream.child_context(&record);

                if emit_records {
                    if bookmark.as_mut().map_or(true, |b| b.accept(&record)) {
                        sink.emit(Message::record(stream.name, record, Utc::now()))?;
                        self.stats.add_records(1);
                        emitted += 1;
                    } else {
                        self.stats.add_skipped(1);
                    }
                }

                for &child in children {
                    emitted += self.sync_child(child, context.as_ref(), sink).await?;
                }
            }
        }
        self.stats.add_pages(pager.pages_fetched());

        if let Some(Bookmark {
            key,
            max_seen: Some((_, value)),
            ..
        }) = bookmark
        {
            debug!("New bookmark for {}: {value}", stream.name);
            self.state.set_bookmark(stream.name, key, value).await;
        }

        Ok(emitted)
    }

    /// Read a child stream for one parent context.
    ///
    /// A context without the parent key is skipped with a warning.
    pub async fn sync_child(
        &mut self,
        stream: &'static StreamDescriptor,
        context: Option<&Context>,
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let Some(path) = stream.resolve_path(context)? else {
            warn!(
                "Skipping {}: parent key '{}' missing from context",
                stream.name,
                stream.parent.map_or("", |p| p.key)
            );
            return Ok(0);
        };
        let paginator = stream.paginator(self.config.page_size).ok_or_else(|| {
            Error::config(format!("Stream '{}' is not a list endpoint", stream.name))
        })?;

        let client = Arc::clone(&self.client);
        let request = ListRequest::new(path).extend_query(stream.base_query());
        let mut pager = RecordPager::new(&*client, request, paginator);
        let mut emitted = 0;

        while let Some(records) = pager.next_page().await? {
            for record in records {
                let record = post_process(stream, record, context);
                sink.emit(Message::record(stream.name, record, Utc::now()))?;
                emitted += 1;
            }
        }

        self.stats.add_pages(pager.pages_fetched());
        self.stats.add_records(emitted);
        Ok(emitted)
    }

    /// Drain the change event queue for this device
    pub async fn sync_events(
        &mut self,
        stream: &'static StreamDescriptor,
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let known = self.state.get_device_uuid(EVENTS_STREAM).await.is_some();
        let device_uuid =
            resolve_device_uuid(&self.state, self.config.device_uuid.as_deref()).await;
        debug!("Using device uuid {device_uuid}");

        // The server records acks against this id, so it must be on disk first.
        if !known {
            self.emit_state(sink).await?;
        }

        let client = Arc::clone(&self.client);
        let mut synchronizer = EventSynchronizer::new(&*client, device_uuid);
        let summary = synchronizer
            .run(|record| sink.emit(Message::record(stream.name, record, Utc::now())))
            .await?;

        self.stats.add_records(summary.events);
        self.stats.add_acks(summary.batches);
        Ok(summary.events)
    }

    /// Emit the full run state and persist it
    pub async fn emit_state(&mut self, sink: &mut dyn MessageSink) -> Result<()> {
        let value = serde_json::to_value(self.state.snapshot().await)?;
        sink.emit(Message::state(value))?;
        self.state.save().await
    }

    /// Incremental filter for `stream`, if it replicates incrementally
    async fn bookmark_for(&self, stream: &StreamDescriptor) -> Option<Bookmark> {
        let key = stream.replication_key?;

        let stored = self
            .state
            .get_bookmark(stream.name)
            .await
            .and_then(|v| parse_timestamp(&v));
        let threshold = match (stored, self.config.start_date) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        if let Some(threshold) = threshold {
            debug!("Filtering {} on {key} >= {threshold}", stream.name);
        }

        Some(Bookmark {
            key,
            threshold,
            max_seen: None,
        })
    }
}

/// Incremental filter and bookmark tracker for one stream run
struct Bookmark {
    key: &'static str,
    threshold: Option<DateTime<Utc>>,
    /// Newest accepted value, parsed and as received
    max_seen: Option<(DateTime<Utc>, String)>,
}

impl Bookmark {
    /// Whether `record` is new enough to emit.
    ///
    /// Records without a parseable replication value are always emitted.
    fn accept(&mut self, record: &JsonValue) -> bool {
        let Some(raw) = record.get(self.key).and_then(JsonValue::as_str) else {
            return true;
        };
        let Some(ts) = parse_timestamp(raw) else {
            return true;
        };

        if self.threshold.is_some_and(|t| ts < t) {
            return false;
        }

        if self.max_seen.as_ref().map_or(true, |(max, _)| ts > *max) {
            self.max_seen = Some((ts, raw.to_string()));
        }
        true
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests;
