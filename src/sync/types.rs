//! Session lifecycle types

use std::fmt;

/// Stream the device id is persisted under
pub const EVENTS_STREAM: &str = "events";

/// Lifecycle of one event sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session requested yet
    #[default]
    NotStarted,
    /// Session opened, nothing fetched yet
    SessionActive,
    /// At least one non-empty batch was delivered
    Draining,
    /// The queue returned an empty batch
    Drained,
    /// The server had nothing to deliver
    NoContent,
}

impl SessionState {
    /// Whether the run is over
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Drained | Self::NoContent)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::SessionActive => "SESSION_ACTIVE",
            Self::Draining => "DRAINING",
            Self::Drained => "DRAINED",
            Self::NoContent => "NO_CONTENT",
        };
        f.write_str(s)
    }
}

/// Outcome of an event sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSyncSummary {
    /// Device id used for every call
    pub device_uuid: String,
    /// Events delivered
    pub events: usize,
    /// Non-empty batches fetched (one ack each)
    pub batches: usize,
    /// Final lifecycle state
    pub final_state: SessionState,
}
