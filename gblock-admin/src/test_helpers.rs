use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use gblock_common::{GblockConfig, GblockConfigStore};
use gblock_core::identity::StaticCentralIdLookup;
use gblock_core::local_blocks::LoggingLocalBlockSink;
use gblock_core::Services;
use gblock_db_migrations::migrate_database;
use poem::Endpoint;
use sea_orm::Database;

use crate::AdminServer;

pub(crate) async fn test_app() -> impl Endpoint {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migrate_database(&db).await.unwrap();

    let store = GblockConfigStore {
        central_ids: BTreeMap::from([("Example".to_owned(), 7), ("Other user".to_owned(), 8)]),
        ..Default::default()
    };
    let identity = Arc::new(StaticCentralIdLookup::new(&store.central_ids));
    let config = GblockConfig {
        store,
        paths_relative_to: PathBuf::from("."),
    };

    let services =
        Services::with_connection(db, config, identity, Arc::new(LoggingLocalBlockSink));
    AdminServer::new(&services).app()
}
