//! arcdex CLI: Arc Raiders wiki item scraper and catalog generator.
//!
//! Scrapes item listing and item pages into a JSON cache, then renders a
//! self-contained HTML catalog that sorts and filters in the browser.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
