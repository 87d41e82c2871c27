use std::sync::Arc;

use anyhow::Result;
use gblock_common::GblockConfig;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::db::connect_to_db;
use crate::global_blocks::GlobalBlockService;
use crate::identity::{CentralIdLookup, StaticCentralIdLookup};
use crate::local_blocks::{LocalBlockSink, LoggingLocalBlockSink};
use crate::resolution::BlockResolver;

#[derive(Clone)]
pub struct Services {
    pub config: Arc<GblockConfig>,
    pub identity: Arc<dyn CentralIdLookup>,
    pub resolver: Arc<BlockResolver>,
    pub global_blocks: Arc<GlobalBlockService>,
}

impl Services {
    pub async fn new(config: GblockConfig) -> Result<Self> {
        let db = connect_to_db(&config).await?;
        let identity = Arc::new(StaticCentralIdLookup::new(&config.store.central_ids));
        info!(
            known_accounts = config.store.central_ids.len(),
            site = %config.store.blocking.site_id,
            "Global blocking services ready"
        );
        Ok(Self::with_connection(
            db,
            config,
            identity,
            Arc::new(LoggingLocalBlockSink),
        ))
    }

    /// Wires the services around an existing connection and identity source.
    pub fn with_connection(
        db: DatabaseConnection,
        config: GblockConfig,
        identity: Arc<dyn CentralIdLookup>,
        local_blocks: Arc<dyn LocalBlockSink>,
    ) -> Self {
        let global_blocks = Arc::new(GlobalBlockService::new(
            db.clone(),
            identity.clone(),
            local_blocks,
            config.store.blocking.clone(),
        ));
        Self {
            config: Arc::new(config),
            identity,
            resolver: global_blocks.resolver(),
            global_blocks,
        }
    }
}
