use anyhow::Result;
use gblock_core::Services;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    let services = Services::new(config).await?;
    let stats = services.global_blocks.purge_expired().await?;
    info!(
        expired_blocks = stats.expired_blocks_removed,
        expired_exemptions = stats.expired_exemptions_removed,
        "Purge completed"
    );
    Ok(())
}
