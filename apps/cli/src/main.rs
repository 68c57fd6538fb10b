//! pcfharvest CLI — Product Carbon Footprint document harvester.
//!
//! Discovers PCF PDF reports on a brand's website (with an external-search
//! fallback) and downloads them into a content-addressed local store.

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
