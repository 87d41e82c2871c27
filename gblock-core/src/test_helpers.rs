use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gblock_common::address::RawTarget;
use gblock_common::{BlockId, BlockingConfig};
use gblock_db_entities::{BlockWhitelist, GlobalBlock};
use gblock_db_migrations::migrate_database;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::global_blocks::GlobalBlockService;
use crate::identity::StaticCentralIdLookup;
use crate::local_blocks::LoggingLocalBlockSink;
use crate::resolution::BlockResolver;

pub(crate) async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migrate_database(&db).await.unwrap();
    db
}

pub(crate) fn test_identity() -> Arc<StaticCentralIdLookup> {
    Arc::new(StaticCentralIdLookup::new(&BTreeMap::from([
        ("Example".to_owned(), 7),
        ("Other user".to_owned(), 8),
    ])))
}

pub(crate) fn test_resolver(db: &DatabaseConnection, config: BlockingConfig) -> BlockResolver {
    BlockResolver::new(db.clone(), test_identity(), config)
}

pub(crate) fn test_service(db: &DatabaseConnection, config: BlockingConfig) -> GlobalBlockService {
    GlobalBlockService::new(
        db.clone(),
        test_identity(),
        Arc::new(LoggingLocalBlockSink),
        config,
    )
}

/// A raw row for `address`, bypassing validation.
pub(crate) fn block_row(
    address: &str,
    central_id: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
) -> GlobalBlock::ActiveModel {
    let bounds = RawTarget::parse(address).bounds();
    GlobalBlock::ActiveModel {
        address: Set(address.to_owned()),
        target_central_id: Set(central_id),
        by_name: Set("Steward".to_owned()),
        by_central_id: Set(Some(1)),
        by_site: Set("meta".to_owned()),
        reason: Set("abuse".to_owned()),
        created_at: Set(Utc::now()),
        expires_at: Set(expires_at),
        anon_only: Set(false),
        range_start: Set(bounds.as_ref().map(|b| b.start.clone()).unwrap_or_default()),
        range_end: Set(bounds.map(|b| b.end).unwrap_or_default()),
        ..Default::default()
    }
}

pub(crate) async fn insert_block(
    db: &DatabaseConnection,
    address: &str,
    central_id: Option<i32>,
) -> BlockId {
    block_row(address, central_id, None)
        .insert(db)
        .await
        .unwrap()
        .id
}

pub(crate) async fn insert_exemption(
    db: &DatabaseConnection,
    block_id: BlockId,
    address: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    BlockWhitelist::ActiveModel {
        id: Set(block_id),
        address: Set(address.to_owned()),
        target_central_id: Set(None),
        granted_by: Set("Local admin".to_owned()),
        reason: Set("shared school address".to_owned()),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await
    .unwrap();
}
