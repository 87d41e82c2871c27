use anyhow::Result;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    info!(
        listen = %config.store.http.listen,
        ipv4_limit = config.store.blocking.cidr_limit.ipv4,
        ipv6_limit = config.store.blocking.cidr_limit.ipv6,
        "No problems found"
    );
    Ok(())
}
