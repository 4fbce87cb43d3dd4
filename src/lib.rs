// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-zendesk-sell
//!
//! Extraction tap for the Zendesk Sell CRM API.
//!
//! ## Features
//!
//! - **23 streams**: deals, contacts, leads, orders and the rest of the CRM
//! - **Pagination**: page numbers and server-issued `next_page` links
//! - **Custom fields**: merged into stream schemas at discovery time
//! - **Change events**: the start/fetch/ack sync session protocol
//! - **Incremental sync**: `updated_at` bookmarks for the large resources
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_zendesk_sell::{output::JsonLinesWriter, state::StateManager, SellTap, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_zendesk_sell::Result<()> {
//!     let tap = SellTap::new(TapConfig::with_token("..."))?;
//!
//!     let catalog = tap.discover().await?;
//!     println!("{} streams", catalog.streams.len());
//!
//!     let mut sink = JsonLinesWriter::new(std::io::stdout());
//!     tap.sync(&["deals".to_string()], StateManager::in_memory(), &mut sink)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           SellTap                            │
//! │  spec() → ConfigSpec   check()   discover() → Catalog        │
//! │  sync(selection, state, sink) → SCHEMA / RECORD / STATE      │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬────────────┬────┴───────┬────────────┬───────────┐
//! │  Streams  │   Engine   │ Pagination │    Sync    │   HTTP    │
//! ├───────────┼────────────┼────────────┼────────────┼───────────┤
//! │ Registry  │ Pager      │ Page no.   │ Session    │ Retry     │
//! │ Schemas   │ Children   │ Next link  │ Ack        │ Rate limit│
//! │ Transform │ Bookmarks  │ Single     │ Device id  │ Bearer    │
//! └───────────┴────────────┴────────────┴────────────┴───────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Zendesk Sell API client and envelopes
pub mod api;

/// Pagination strategies
pub mod pagination;

/// State management and bookmarks
pub mod state;

/// JSON lines output
pub mod output;

/// Main execution engine
pub mod engine;

/// Change event sync sessions
pub mod sync;

/// Configuration and catalog types
pub mod config;

/// Stream descriptors and static schemas
pub mod streams;

/// JSON schema types and custom field discovery
pub mod schema;

/// Tap entry points
pub mod tap;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{Catalog, TapConfig};
pub use error::{Error, Result};
pub use tap::{CheckResult, SellTap};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
