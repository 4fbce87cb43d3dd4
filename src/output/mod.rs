//! Output module
//!
//! Serializes engine messages as JSON lines.
//!
//! # Overview
//!
//! The engine never writes to stdout directly; it hands every message to a
//! [`MessageSink`]. The CLI uses [`JsonLinesWriter`] over stdout, tests
//! collect into a `Vec<Message>`.

mod writer;

pub use writer::{JsonLinesWriter, MessageSink, OutputFormat};

#[cfg(test)]
mod tests;
