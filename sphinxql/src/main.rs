//! SphinxQL command-line client.
//!
//! Connects to a Sphinx or Manticore SphinxQL listener and runs statements,
//! escapes values, or checks connectivity.

use clap::Parser;
use sphinxql::{Cli, run};
use sphinxql_core::init_logging;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    run(&cli).await.map_err(|e| {
        error!("{:#}", e);
        e
    })
}
