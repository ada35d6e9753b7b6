mod cli;
mod config;
mod error;
mod output;
mod pipeline;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting clocbot");
    cli.execute().await?;

    Ok(())
}
