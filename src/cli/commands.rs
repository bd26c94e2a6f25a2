//! CLI commands and argument parsing

use crate::config::API_KEY_ENV;
use crate::types::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bulk exporter for contact records
#[derive(Parser, Debug)]
#[command(name = "fub-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key (sent as the Basic auth username)
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch records and write them to files
    Export {
        /// Maximum number of records to collect
        #[arg(long)]
        target: Option<usize>,

        /// Records requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Directory to write files to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format (repeatable; defaults to csv and json)
        #[arg(short, long = "format", value_enum)]
        formats: Vec<ExportFormat>,

        /// Fetch a small sample instead of a bulk export
        #[arg(long)]
        sample: bool,

        /// Exit non-zero if the run ended on a rate-limit or request failure
        #[arg(long)]
        strict: bool,
    },

    /// Fetch a sample, format each contact and print it as JSON
    Stream {
        /// Number of contacts to stream
        #[arg(long)]
        target: Option<usize>,

        /// Records requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// One JSON document per line
        #[arg(long)]
        compact: bool,
    },

    /// Fetch a single record to test the connection
    Check,
}
