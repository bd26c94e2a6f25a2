//! CLI module
//!
//! Command-line interface for exporting contacts.
//!
//! # Commands
//!
//! - `export` - Fetch records and write CSV/JSON/Parquet files
//! - `stream` - Fetch a sample and print formatted contacts
//! - `check` - Test connection to the API

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
