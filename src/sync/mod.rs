//! Change event synchronization
//!
//! The `events` stream is read through a session protocol rather than
//! pagination:
//!
//! 1. `POST /sync/start` opens a session (or answers 204 when the device has
//!    nothing pending)
//! 2. `GET /sync/{id}/queues/main` is fetched until it returns no items
//! 3. every non-empty batch is acknowledged with one `POST /sync/ack`
//!    before the next fetch
//!
//! All calls carry the device id. The server tracks delivery per device,
//! so the id is persisted in state and reused on every run.

mod types;

pub use types::{EventSyncSummary, SessionState, EVENTS_STREAM};

use crate::api::ResourceClient;
use crate::error::{Error, Result};
use crate::state::StateManager;
use crate::types::OptionStringExt;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Resolve the device id for this run.
///
/// A device id already in state wins over the configured one; with neither
/// a new v4 id is generated. The chosen id is always written back to state.
pub async fn resolve_device_uuid(state: &StateManager, configured: Option<&str>) -> String {
    let device_uuid = match state.get_device_uuid(EVENTS_STREAM).await {
        Some(existing) => existing,
        None => match configured.map(str::to_string).none_if_empty() {
            Some(configured) => configured,
            None => {
                let generated = Uuid::new_v4().to_string();
                info!("Generated device uuid {generated}");
                generated
            }
        },
    };

    state
        .set_device_uuid(EVENTS_STREAM, device_uuid.clone())
        .await;
    device_uuid
}

/// Drives one start/fetch/ack session for a device
pub struct EventSynchronizer<'a> {
    client: &'a dyn ResourceClient,
    device_uuid: String,
    state: SessionState,
}

impl<'a> EventSynchronizer<'a> {
    /// Create a synchronizer for `device_uuid`
    pub fn new(client: &'a dyn ResourceClient, device_uuid: impl Into<String>) -> Self {
        Self {
            client,
            device_uuid: device_uuid.into(),
            state: SessionState::NotStarted,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Device id in use
    pub fn device_uuid(&self) -> &str {
        &self.device_uuid
    }

    /// Run the session to completion, handing every event to `on_event`.
    ///
    /// Each batch is fully handed over before it is acknowledged; an error
    /// from `on_event` stops the run without acknowledging that batch.
    pub async fn run<F>(&mut self, mut on_event: F) -> Result<EventSyncSummary>
    where
        F: FnMut(Value) -> Result<()>,
    {
        let mut summary = EventSyncSummary {
            device_uuid: self.device_uuid.clone(),
            ..EventSyncSummary::default()
        };

        let session = self
            .client
            .start_session(&self.device_uuid)
            .await
            .map_err(|e| Error::protocol(format!("Failed to start sync session: {e}")))?;

        let Some(session) = session else {
            info!("No events pending for device {}", self.device_uuid);
            self.state = SessionState::NoContent;
            summary.final_state = self.state;
            return Ok(summary);
        };

        debug!("Sync session {} started", session.id);
        self.state = SessionState::SessionActive;

        loop {
            let items = self
                .client
                .fetch_queue(&self.device_uuid, &session.id)
                .await
                .map_err(|e| Error::protocol(format!("Failed to fetch sync queue: {e}")))?;

            if items.is_empty() {
                self.state = SessionState::Drained;
                break;
            }
            self.state = SessionState::Draining;

            let mut ack_keys = Vec::with_capacity(items.len());
            for item in items {
                let ack_key = item
                    .ack_key()
                    .map(str::to_string)
                    .ok_or_else(|| Error::protocol("Queue item without ack_key"))?;
                on_event(item.into_record())?;
                ack_keys.push(ack_key);
            }

            summary.events += ack_keys.len();
            summary.batches += 1;
            debug!("Acknowledging {} events", ack_keys.len());

            self.client
                .ack(&self.device_uuid, &ack_keys)
                .await
                .map_err(|e| Error::protocol(format!("Failed to acknowledge events: {e}")))?;
        }

        info!(
            "Sync session {} drained: {} events in {} batches",
            session.id, summary.events, summary.batches
        );
        summary.final_state = self.state;
        Ok(summary)
    }
}
