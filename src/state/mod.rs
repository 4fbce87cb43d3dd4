//! State management module
//!
//! Tracks replication bookmarks and the sync-protocol device identity.
//! State is persisted between runs so incremental streams resume and the
//! events stream keeps the same logical device.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Core state structure, keyed by stream
//! - `StateManager` - Shared, optionally file-backed state

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState};
