//! CRM API access
//!
//! - `ResourceClient` - the capability streams and the synchronizer use
//! - `SellClient` - its HTTP implementation
//! - Envelope types for list pages and sync queue items

mod client;
mod types;

pub use client::{ResourceClient, SellClient, DEVICE_UUID_HEADER};
pub use types::{decode_queue, decode_records, ListPage, ListRequest, QueueItem, SyncSession};
