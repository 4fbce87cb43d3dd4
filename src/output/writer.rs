//! Message sinks

use crate::engine::Message;
use crate::error::{Error, Result};
use clap::ValueEnum;
use std::io::Write;

/// Destination for emitted messages
pub trait MessageSink {
    /// Emit one message
    fn emit(&mut self, message: Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON object per line
    #[default]
    Json,
    /// Indented JSON, one object per block
    Pretty,
}

/// Writes messages as JSON lines
pub struct JsonLinesWriter<W: Write> {
    /// Underlying writer
    writer: W,
    /// Output encoding
    format: OutputFormat,
    /// Number of messages written
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Create a compact writer
    pub fn new(writer: W) -> Self {
        Self::with_format(writer, OutputFormat::Json)
    }

    /// Create a writer with an explicit format
    pub fn with_format(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    /// Number of messages written so far
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Consume the writer and return the inner one
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        let line = match self.format {
            OutputFormat::Json => serde_json::to_string(&message)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(&message)?,
        };

        writeln!(self.writer, "{line}").map_err(|e| Error::Output {
            message: format!("Failed to write message: {e}"),
        })?;

        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::Output {
            message: format!("Failed to flush output: {e}"),
        })
    }
}
