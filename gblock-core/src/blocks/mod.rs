//! Persistent storage of global block records.

mod query;

use chrono::Utc;
use gblock_common::address::{BlockTarget, RangeBounds};
use gblock_common::{BlockId, CentralId, GblockError};
use gblock_db_entities::{BlockWhitelist, GlobalBlock};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::{debug, info};

pub(crate) use query::{active_condition, containment_condition};
pub use query::LookupFlags;

/// Statistics from a purge sweep
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub expired_blocks_removed: u64,
    pub expired_exemptions_removed: u64,
}

#[derive(Clone)]
pub struct GlobalBlockStore {
    db: DatabaseConnection,
}

impl GlobalBlockStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Active records covering `bounds` or targeting `central_id`.
    pub async fn find_candidates(
        &self,
        bounds: Option<&RangeBounds>,
        central_id: Option<CentralId>,
        flags: LookupFlags,
    ) -> Result<Vec<GlobalBlock::Model>, GblockError> {
        let Some(condition) = query::candidate_condition(bounds, central_id, flags) else {
            return Ok(vec![]);
        };

        Ok(GlobalBlock::Entity::find()
            .filter(condition)
            .filter(active_condition(Utc::now()))
            .order_by_asc(GlobalBlock::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Id of the active record for exactly this target.
    pub async fn find_id(&self, target: &BlockTarget) -> Result<Option<BlockId>, GblockError> {
        Ok(Self::exact_target_query(target)
            .filter(active_condition(Utc::now()))
            .select_only()
            .column(GlobalBlock::Column::Id)
            .into_tuple::<BlockId>()
            .one(&self.db)
            .await?)
    }

    /// Record for exactly this target, including expired rows that have not
    /// been purged yet.
    pub async fn find_by_target(
        &self,
        target: &BlockTarget,
    ) -> Result<Option<GlobalBlock::Model>, GblockError> {
        Ok(Self::exact_target_query(target).one(&self.db).await?)
    }

    fn exact_target_query(target: &BlockTarget) -> sea_orm::Select<GlobalBlock::Entity> {
        let query = GlobalBlock::Entity::find();
        match target.central_id() {
            Some(central_id) => {
                query.filter(GlobalBlock::Column::TargetCentralId.eq(central_id))
            }
            None => query.filter(GlobalBlock::Column::Address.eq(target.address())),
        }
    }

    /// Returns the number of inserted rows. Zero means another writer
    /// already holds this address.
    pub async fn insert(&self, record: GlobalBlock::ActiveModel) -> Result<u64, GblockError> {
        Ok(GlobalBlock::Entity::insert(record)
            .on_conflict(
                OnConflict::column(GlobalBlock::Column::Address)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?)
    }

    pub async fn update(
        &self,
        id: BlockId,
        record: GlobalBlock::ActiveModel,
    ) -> Result<u64, GblockError> {
        Ok(GlobalBlock::Entity::update_many()
            .set(record)
            .filter(GlobalBlock::Column::Id.eq(id))
            .exec(&self.db)
            .await?
            .rows_affected)
    }

    pub async fn delete(&self, id: BlockId) -> Result<u64, GblockError> {
        Ok(GlobalBlock::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?
            .rows_affected)
    }

    /// Deletes up to `limit` expired blocks and every expired exemption.
    pub async fn purge_expired(&self, limit: u64) -> Result<PurgeStats, GblockError> {
        let now = Utc::now();

        let expired_ids: Vec<BlockId> = GlobalBlock::Entity::find()
            .filter(query::expired_condition(now))
            .select_only()
            .column(GlobalBlock::Column::Id)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await?;

        let expired_blocks_removed = if expired_ids.is_empty() {
            0
        } else {
            GlobalBlock::Entity::delete_many()
                .filter(GlobalBlock::Column::Id.is_in(expired_ids))
                .exec(&self.db)
                .await?
                .rows_affected
        };

        let expired_exemptions_removed = BlockWhitelist::Entity::delete_many()
            .filter(BlockWhitelist::Column::ExpiresAt.is_not_null())
            .filter(BlockWhitelist::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?
            .rows_affected;

        let stats = PurgeStats {
            expired_blocks_removed,
            expired_exemptions_removed,
        };

        if stats != PurgeStats::default() {
            info!(
                expired_blocks = stats.expired_blocks_removed,
                expired_exemptions = stats.expired_exemptions_removed,
                "Purged expired global blocks"
            );
        } else {
            debug!("No expired global blocks to purge");
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::{PaginatorTrait, Set};

    use super::*;
    use crate::test_helpers::{block_row, insert_exemption, test_db};

    #[tokio::test]
    async fn test_candidates_are_unioned_by_address_and_user() {
        let store = GlobalBlockStore::new(test_db().await);
        store
            .insert(block_row("203.0.113.0/24", None, None))
            .await
            .unwrap();
        store
            .insert(block_row("Example", Some(7), None))
            .await
            .unwrap();
        store
            .insert(block_row("198.51.100.1", None, None))
            .await
            .unwrap();

        let bounds = RangeBounds::of_ip("203.0.113.5".parse().unwrap());
        let found = store
            .find_candidates(Some(&bounds), Some(7), LookupFlags::default())
            .await
            .unwrap();
        let addresses: Vec<_> = found.iter().map(|b| b.address.as_str()).collect();
        assert_eq!(addresses, vec!["203.0.113.0/24", "Example"]);
    }

    #[tokio::test]
    async fn test_anon_only_is_dropped_for_address_matches_only() {
        let store = GlobalBlockStore::new(test_db().await);
        let mut anon_range = block_row("203.0.113.0/24", None, None);
        anon_range.anon_only = Set(true);
        store.insert(anon_range).await.unwrap();
        let mut anon_user = block_row("Example", Some(7), None);
        anon_user.anon_only = Set(true);
        store.insert(anon_user).await.unwrap();

        let bounds = RangeBounds::of_ip("203.0.113.5".parse().unwrap());
        let flags = LookupFlags {
            exclude_ip_blocks: false,
            exclude_anon_only: true,
        };
        let found = store
            .find_candidates(Some(&bounds), Some(7), flags)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, "Example");
    }

    #[tokio::test]
    async fn test_expired_records_are_not_candidates() {
        let store = GlobalBlockStore::new(test_db().await);
        store
            .insert(block_row(
                "203.0.113.5",
                None,
                Some(Utc::now() - Duration::hours(1)),
            ))
            .await
            .unwrap();

        let bounds = RangeBounds::of_ip("203.0.113.5".parse().unwrap());
        let found = store
            .find_candidates(Some(&bounds), None, LookupFlags::default())
            .await
            .unwrap();
        assert!(found.is_empty());

        let target = BlockTarget::Ip("203.0.113.5".parse().unwrap());
        assert_eq!(store.find_id(&target).await.unwrap(), None);
        assert!(store.find_by_target(&target).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_insert_affects_no_rows() {
        let store = GlobalBlockStore::new(test_db().await);
        assert_eq!(
            store
                .insert(block_row("203.0.113.5", None, None))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .insert(block_row("203.0.113.5", None, None))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_purge_respects_limit_and_clears_exemptions() {
        let db = test_db().await;
        let store = GlobalBlockStore::new(db.clone());
        let past = Some(Utc::now() - Duration::minutes(5));
        for address in ["192.0.2.1", "192.0.2.2", "192.0.2.3"] {
            store.insert(block_row(address, None, past)).await.unwrap();
        }
        store
            .insert(block_row("192.0.2.4", None, None))
            .await
            .unwrap();
        insert_exemption(&db, 4, "192.0.2.4", past).await;

        let stats = store.purge_expired(2).await.unwrap();
        assert_eq!(stats.expired_blocks_removed, 2);
        assert_eq!(stats.expired_exemptions_removed, 1);

        let stats = store.purge_expired(1000).await.unwrap();
        assert_eq!(stats.expired_blocks_removed, 1);

        let remaining = GlobalBlock::Entity::find().count(&db).await.unwrap();
        assert_eq!(remaining, 1);
    }
}
