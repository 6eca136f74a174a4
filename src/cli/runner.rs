//! CLI runner - executes commands

use crate::accumulate::merge_pages;
use crate::auth::{EnvTokenProvider, StaticTokenProvider, TokenProvider};
use crate::cli::commands::{Cli, Commands, OutputFormat, QueryArgs};
use crate::client::QueryClient;
use crate::config::ConfigFile;
use crate::error::{Error, Result, ResultExt};
use crate::http::Diagnostics;
use crate::query::QueryDescriptor;
use bytes::Bytes;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

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
            Commands::Query(args) => {
                let cancel = CancellationToken::new();
                let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

                let mut stdout = std::io::stdout();
                let result = self.query(args, cancel, &mut stdout).await;
                watcher.abort();
                result
            }
        }
    }

    /// Run a query, writing results to `out`
    pub async fn query<W: Write>(
        &self,
        args: &QueryArgs,
        cancel: CancellationToken,
        out: &mut W,
    ) -> Result<()> {
        let client = self.build_client(args)?;
        let descriptor = Self::build_descriptor(args)?;
        let mut pager = client.pager(&descriptor)?.with_cancellation(cancel);

        let started = Instant::now();
        let mut pages: Vec<Bytes> = Vec::new();
        let mut total_records = 0;

        while pager.has_next() {
            if args
                .max_pages
                .is_some_and(|max| pager.pages_fetched() >= max)
            {
                info!(
                    pages = pager.pages_fetched(),
                    "Stopping at --max-pages limit"
                );
                break;
            }

            let page = pager.next().await?;
            total_records = page.total_records;
            if page.truncated {
                warn!("Service reported a truncated result set");
            }

            match args.format {
                OutputFormat::Jsonl => write_line(out, &page.into_data())?,
                OutputFormat::Json | OutputFormat::Pretty => pages.push(page.into_data()),
            }
        }

        match args.format {
            OutputFormat::Json => {
                out.write_all(&merge_pages(&pages))?;
                writeln!(out)?;
            }
            OutputFormat::Pretty => {
                let merged: serde_json::Value = serde_json::from_slice(&merge_pages(&pages))
                    .context("Merged pages are not valid JSON")?;
                writeln!(out, "{}", serde_json::to_string_pretty(&merged)?)?;
            }
            OutputFormat::Jsonl => {}
        }
        out.flush()?;

        info!(
            pages = pager.pages_fetched(),
            records = pager.records_fetched(),
            total_records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query complete"
        );
        Ok(())
    }

    /// Build the query client from config file, environment and flags
    fn build_client(&self, args: &QueryArgs) -> Result<QueryClient> {
        let file = self.load_config()?;

        let mut config = file.client.clone();
        config.diagnostics = Diagnostics {
            dump_requests: config.diagnostics.dump_requests || args.dump_requests,
            dump_responses: config.diagnostics.dump_responses
                || args.dump_responses
                || args.dump_bodies,
            dump_response_bodies: config.diagnostics.dump_response_bodies || args.dump_bodies,
        };

        QueryClient::builder()
            .config(config)
            .token_provider(self.token_provider(file)?)
            .build()
    }

    /// Load the config file, if any, and apply environment overrides
    fn load_config(&self) -> Result<ConfigFile> {
        let file = match &self.cli.config {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                ConfigFile::from_path(path)?
            }
            None => ConfigFile::default(),
        };
        Ok(file.apply_env())
    }

    /// Pick the credential source: `--token`, then the config file, then
    /// `AZURE_ACCESS_TOKEN`
    fn token_provider(&self, file: ConfigFile) -> Result<Arc<dyn TokenProvider>> {
        if let Some(token) = &self.cli.token {
            return Ok(Arc::new(StaticTokenProvider::new(token.clone())));
        }
        match file.credentials {
            Some(credentials) => credentials.into_provider(),
            None => Ok(Arc::new(EnvTokenProvider::new())),
        }
    }

    /// Build the descriptor from positional text or `--file`
    fn build_descriptor(args: &QueryArgs) -> Result<QueryDescriptor> {
        let text = match (&args.query, &args.file) {
            (Some(query), _) => query.clone(),
            (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
                Error::config(format!("Failed to read query file {}: {e}", path.display()))
            })?,
            (None, None) => return Err(Error::invalid_query("no query given")),
        };

        let descriptor = QueryDescriptor::new(text.trim())
            .subscriptions(args.subscriptions.iter().cloned())
            .management_groups(args.management_groups.iter().cloned())
            .allow_partial_scopes(args.allow_partial_scopes)
            .top(args.top)
            .skip(args.skip);
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// Write one page as a single JSON line
fn write_line<W: Write>(out: &mut W, data: &[u8]) -> Result<()> {
    if data.contains(&b'\n') {
        let value: serde_json::Value =
            serde_json::from_slice(data).context("Page data is not valid JSON")?;
        serde_json::to_writer(&mut *out, &value)?;
    } else {
        out.write_all(data)?;
    }
    writeln!(out)?;
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling query");
        cancel.cancel();
    }
}
