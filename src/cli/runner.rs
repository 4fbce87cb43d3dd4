//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::output::{JsonLinesWriter, OutputFormat};
use crate::state::StateManager;
use crate::streams;
use crate::tap::SellTap;
use serde_json::{json, Value};
use std::io::{self, Write};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Read { streams } => self.read(streams.as_deref()).await,
            Commands::Streams => self.streams(),
        }
    }

    /// Load and validate configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json(json_str);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration given (use --config or --config-json)",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn tap(&self) -> Result<SellTap> {
        SellTap::new(self.load_config()?)
    }

    /// Print the configuration specification
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": SellTap::spec(),
        }))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let tap = self.tap()?;
        let result = tap.check().await;

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": if result.success { "SUCCEEDED" } else { "FAILED" },
                "message": result.message,
            }
        }))?;

        if result.success {
            Ok(())
        } else {
            Err(Error::config("Connection check failed"))
        }
    }

    /// Discover streams
    async fn discover(&self) -> Result<()> {
        let catalog = self.tap()?.discover().await?;
        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog,
        }))
    }

    /// Read streams
    async fn read(&self, streams: Option<&str>) -> Result<()> {
        let tap = self.tap()?;
        let state = self.load_state()?;
        let selection = Commands::stream_selection(streams);

        let stdout = io::stdout();
        let mut sink = JsonLinesWriter::with_format(stdout.lock(), self.cli.format);
        let stats = tap.sync(&selection, state, &mut sink).await?;

        info!(
            "Read {} records ({} skipped) in {} pages, {} event batches acknowledged",
            stats.records_synced, stats.records_skipped, stats.pages_fetched, stats.acks_sent
        );
        Ok(())
    }

    /// List stream names
    fn streams(&self) -> Result<()> {
        let names: Vec<&str> = streams::all().iter().map(|s| s.name).collect();
        self.output_message(&json!({
            "type": "STREAMS",
            "streams": names,
            "tap": crate::NAME,
        }))
    }

    fn output_message(&self, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|e| Error::Output {
            message: format!("Failed to write output: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["tap-zendesk-sell"];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_inline_config_wins() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"access_token": "from-file"}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let config = runner(&[
            "check",
            "--config",
            path,
            "--config-json",
            r#"{"access_token": "inline"}"#,
        ])
        .load_config()
        .unwrap();
        assert_eq!(config.token(), "inline");

        let config = runner(&["check", "--config", path]).load_config().unwrap();
        assert_eq!(config.token(), "from-file");
    }

    #[test]
    fn test_missing_config_is_error() {
        let err = runner(&["check"]).load_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = runner(&["read", "--config-json", r#"{"access_token": "  "}"#])
            .tap()
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[tokio::test]
    async fn test_inline_state() {
        let state = runner(&[
            "read",
            "--state-json",
            r#"{"bookmarks": {"events": {"device_uuid": "D1"}}}"#,
        ])
        .load_state()
        .unwrap();

        assert_eq!(state.get_device_uuid("events").await.as_deref(), Some("D1"));
    }
}
