//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Describe the accepted configuration
//! - `check` - Test connection to the API
//! - `discover` - Print the catalog with live custom field schemas
//! - `read` - Extract data from streams
//! - `streams` - List stream names (lightweight, no network)

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
