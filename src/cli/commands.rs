//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Azure Resource Graph query CLI
#[derive(Parser, Debug)]
#[command(name = "rgq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true, env = "RGQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bearer token for Azure Resource Manager (overrides config and environment)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a Resource Graph query and print every result page
    Query(QueryArgs),
}

/// Arguments of the `query` command
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Query text (Kusto)
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub query: Option<String>,

    /// Read the query text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Subscription to query (repeatable)
    #[arg(short, long = "subscription")]
    pub subscriptions: Vec<String>,

    /// Management group to query (repeatable)
    #[arg(short, long = "management-group")]
    pub management_groups: Vec<String>,

    /// Records per page requested from the service (0 = service default)
    #[arg(long, default_value = "0")]
    pub top: u32,

    /// Records to skip before the first page
    #[arg(long, default_value = "0")]
    pub skip: u32,

    /// Return results from the accessible scopes when some are denied
    #[arg(long)]
    pub allow_partial_scopes: bool,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u64>,

    /// Log outgoing requests
    #[arg(long)]
    pub dump_requests: bool,

    /// Log response status and headers
    #[arg(long)]
    pub dump_responses: bool,

    /// Log response bodies
    #[arg(long)]
    pub dump_bodies: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON array holding every record
    Json,
    /// One JSON array per line, one line per page
    Jsonl,
    /// Pretty-printed JSON array
    Pretty,
}
