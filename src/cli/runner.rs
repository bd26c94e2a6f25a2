//! CLI runner - executes commands

use crate::auth::Credential;
use crate::cli::commands::{Cli, Commands};
use crate::config::ExportConfig;
use crate::connector::{HttpPageSource, PageSource, RequestOutcome};
use crate::engine::{FetchController, FetchOutcome};
use crate::error::{Error, Result};
use crate::output::export_records;
use crate::publish::{publish_records, JsonLinesPublisher};
use crate::types::FetchMode;
use chrono::Local;
use serde_json::{json, Value};
use std::future::Future;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit code used when a second interrupt aborts the process
const ABORT_EXIT_CODE: i32 = 130;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing messages and contacts to stdout
    pub async fn run(&self) -> Result<()> {
        self.run_with_output(&mut std::io::stdout()).await
    }

    /// Run the CLI command, writing messages and contacts to `out`
    pub async fn run_with_output<W: Write + Send>(&self, out: &mut W) -> Result<()> {
        let config = self.resolve_config()?;

        match &self.cli.command {
            Commands::Export { strict, .. } => self.export(&config, *strict, out).await,
            Commands::Stream { compact, .. } => self.stream(&config, *compact, out).await,
            Commands::Check => self.check(&config, out).await,
        }
    }

    /// Load the config file and apply command-line overrides
    pub fn resolve_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ExportConfig::from_file(path)?,
            None => ExportConfig::default(),
        };

        if let Some(key) = &self.cli.api_key {
            config = config.with_api_key(Credential::new(key.clone()));
        }
        if let Some(base_url) = &self.cli.base_url {
            config.api.base_url.clone_from(base_url);
        }

        match &self.cli.command {
            Commands::Export {
                target,
                page_size,
                output_dir,
                formats,
                sample,
                ..
            } => {
                if *sample {
                    config.fetch.mode = FetchMode::Sample;
                }
                if target.is_some() {
                    config.fetch.target_count = *target;
                }
                if let Some(size) = page_size {
                    config.fetch.page_size = *size;
                }
                if let Some(dir) = output_dir {
                    config.output.dir.clone_from(dir);
                }
                if !formats.is_empty() {
                    config.output.formats.clone_from(formats);
                }
            }
            Commands::Stream {
                target, page_size, ..
            } => {
                config.fetch.mode = FetchMode::Sample;
                if target.is_some() {
                    config.fetch.target_count = *target;
                }
                if let Some(size) = page_size {
                    config.fetch.page_size = *size;
                }
            }
            Commands::Check => {}
        }

        config.validate()?;
        Ok(config)
    }

    /// Build a controller whose runs stop on Ctrl-C
    fn build_controller(config: &ExportConfig) -> Result<FetchController<HttpPageSource>> {
        let source = HttpPageSource::new(&config.api, config.api_key.clone())?;
        let token = CancellationToken::new();

        let signal_token = token.clone();
        tokio::spawn(async move {
            if watch_interrupts(tokio::signal::ctrl_c, signal_token).await {
                std::process::exit(ABORT_EXIT_CODE);
            }
        });

        Ok(FetchController::new(source)
            .with_backoff(config.fetch.backoff_config())
            .with_cancellation(token))
    }

    async fn fetch(config: &ExportConfig) -> Result<FetchOutcome> {
        let controller = Self::build_controller(config)?;
        controller
            .fetch(config.fetch.effective_target(), config.fetch.page_size)
            .await
    }

    /// Fetch and write files
    async fn export<W: Write + Send>(
        &self,
        config: &ExportConfig,
        strict: bool,
        out: &mut W,
    ) -> Result<()> {
        info!(mode = %config.fetch.mode, "Exporting contacts");
        let outcome = Self::fetch(config).await?;

        let files = export_records(
            &outcome.records,
            &config.output,
            &Local::now().naive_local(),
        )?;

        Self::output_message(
            out,
            &json!({
                "type": "EXPORT",
                "records": outcome.len(),
                "complete": outcome.termination.is_complete(),
                "termination": outcome.termination.to_string(),
                "requests": outcome.stats.requests,
                "rate_limit_hits": outcome.stats.rate_limit_hits,
                "duration_ms": outcome.stats.duration_ms,
                "files": files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            }),
        )?;

        if strict && outcome.termination.is_failure() {
            return Err(Error::Other(format!(
                "Export incomplete: {}",
                outcome.termination
            )));
        }
        Ok(())
    }

    /// Fetch a sample and publish formatted contacts
    async fn stream<W: Write + Send>(
        &self,
        config: &ExportConfig,
        compact: bool,
        out: &mut W,
    ) -> Result<()> {
        let outcome = Self::fetch(config).await?;

        let mut publisher = if compact {
            JsonLinesPublisher::compact(&mut *out)
        } else {
            JsonLinesPublisher::new(&mut *out)
        };

        publish_records(&mut publisher, &outcome.records).await?;
        info!(published = publisher.published(), "Stream complete");
        Ok(())
    }

    /// Request one record and report the connection status
    async fn check<W: Write + Send>(&self, config: &ExportConfig, out: &mut W) -> Result<()> {
        let source = HttpPageSource::new(&config.api, config.api_key.clone())?;

        let status = match source.fetch_page(None, 1).await {
            RequestOutcome::Success(page) => json!({
                "status": "SUCCEEDED",
                "message": "Connection successful",
                "records": page.len(),
                "has_next": page.next_cursor.is_some(),
            }),
            RequestOutcome::RateLimited { .. } => json!({
                "status": "FAILED",
                "message": "Connection failed: rate limited",
            }),
            RequestOutcome::TransportFailure(e) => json!({
                "status": "FAILED",
                "message": format!("Connection failed: {e}"),
            }),
        };

        Self::output_message(
            out,
            &json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": status,
            }),
        )
    }

    /// Write a status message as a single JSON line
    fn output_message<W: Write>(out: &mut W, msg: &Value) -> Result<()> {
        writeln!(out, "{}", serde_json::to_string(msg)?)?;
        Ok(())
    }
}

/// Cancel `token` on the first interrupt; returns true if a second one arrives
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, token: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    warn!("Interrupt received, stopping fetch (press Ctrl-C again to abort)");
    token.cancel();

    if next_interrupt().await.is_err() {
        return false;
    }
    warn!("Second interrupt received, aborting without writing output");
    true
}
