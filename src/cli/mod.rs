//! CLI module
//!
//! Command-line interface for running Resource Graph queries.
//!
//! # Commands
//!
//! - `query` - Run a query and print every result page

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, QueryArgs};
pub use runner::Runner;
