//! Read side of the local exemption table. Exemptions are granted by a
//! separate privileged workflow; this crate only consults them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use gblock_common::address::BlockTarget;
use gblock_common::expiry::Expiry;
use gblock_common::{BlockId, CentralId, GblockError};
use gblock_db_entities::BlockWhitelist;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExemptionKey {
    BlockId(BlockId),
    CentralId(CentralId),
    Address(String),
}

impl ExemptionKey {
    /// Central id for user targets, the normalized address otherwise.
    pub fn for_target(target: &BlockTarget) -> Self {
        match target.central_id() {
            Some(central_id) => Self::CentralId(central_id),
            None => Self::Address(target.address()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exemption {
    pub block_id: BlockId,
    pub granted_by: String,
    pub reason: String,
    pub expiry: Expiry,
}

impl From<BlockWhitelist::Model> for Exemption {
    fn from(model: BlockWhitelist::Model) -> Self {
        Self {
            block_id: model.id,
            granted_by: model.granted_by,
            reason: model.reason,
            expiry: Expiry::from_column(model.expires_at),
        }
    }
}

fn active_condition(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(BlockWhitelist::Column::ExpiresAt.is_null())
        .add(BlockWhitelist::Column::ExpiresAt.gt(now))
}

#[derive(Clone)]
pub struct WhitelistStore {
    db: DatabaseConnection,
}

impl WhitelistStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn lookup(&self, key: ExemptionKey) -> Result<Option<Exemption>, GblockError> {
        let query = BlockWhitelist::Entity::find().filter(active_condition(Utc::now()));
        let query = match key {
            ExemptionKey::BlockId(id) => query.filter(BlockWhitelist::Column::Id.eq(id)),
            ExemptionKey::CentralId(central_id) => {
                query.filter(BlockWhitelist::Column::TargetCentralId.eq(central_id))
            }
            ExemptionKey::Address(address) => {
                query.filter(BlockWhitelist::Column::Address.eq(address))
            }
        };
        Ok(query.one(&self.db).await?.map(Exemption::from))
    }

    /// Active exemptions for any of `ids`, keyed by block id.
    pub async fn lookup_many(
        &self,
        ids: &[BlockId],
    ) -> Result<HashMap<BlockId, Exemption>, GblockError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(BlockWhitelist::Entity::find()
            .filter(active_condition(Utc::now()))
            .filter(BlockWhitelist::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| (model.id, Exemption::from(model)))
            .collect())
    }

    pub async fn exempted_block_ids(
        &self,
        ids: &[BlockId],
    ) -> Result<HashSet<BlockId>, GblockError> {
        Ok(self.lookup_many(ids).await?.into_keys().collect())
    }
}
