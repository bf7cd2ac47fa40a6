//! Narwhal binary entry point.

use anyhow::Result;
use clap::Parser;
use narwhal_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    Cli::parse().run().await
}
