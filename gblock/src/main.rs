mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use logging::init_logging;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "/etc/gblock.yaml", env = "GBLOCK_CONFIG")]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the global blocking API server
    Run,
    /// Validate config file
    Check,
    /// Delete expired blocks and exemptions now
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => crate::commands::run::command(&cli).await,
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::Purge => crate::commands::purge::command(&cli).await,
    }
}
