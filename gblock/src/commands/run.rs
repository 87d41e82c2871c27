use anyhow::Result;
use gblock_admin::AdminServer;
use gblock_common::version::gblock_version;
use gblock_core::Services;
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    info!(version = %gblock_version(), "Global blocking");

    let services = Services::new(load_config(&cli.config, true)?).await?;
    let config = services.config.clone();

    let listen = *config.store.http.listen;
    let admin = AdminServer::new(&services);

    if console::user_attended() {
        info!("--------------------------------------------");
        info!("Global blocking is now running.");
        info!("Accepting API requests on http://{listen}/api");
        if !config.store.blocking.apply_global_blocks {
            warn!("apply_global_blocks is off, status checks will never report a block");
        }
        info!("--------------------------------------------");
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
        result = admin.run(listen) => {
            if let Err(ref error) = result {
                error!(?error, "API server error");
            }
            result
        }
    }
}
