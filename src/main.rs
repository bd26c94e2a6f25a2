//! fub-export CLI
//!
//! Command-line interface for exporting contacts

use clap::Parser;
use fub_export::cli::{Cli, Runner};
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG directives still apply on top
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
