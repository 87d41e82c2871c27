use std::sync::Arc;

use chrono::Utc;
use gblock_common::address::{BlockTarget, RawTarget};
use gblock_common::expiry::Expiry;
use gblock_common::{BlockingConfig, GblockError};
use gblock_db_entities::GlobalBlock;
use sea_orm::{DatabaseConnection, Set};
use tracing::{info, warn};

use super::request::{
    GlobalBlockOutcome, GlobalBlockRequest, Performer, PlaceBlock, PlacedBlock, RemovedBlock,
    RequestError,
};
use crate::blocks::{GlobalBlockStore, LookupFlags, PurgeStats};
use crate::identity::CentralIdLookup;
use crate::local_blocks::{LocalBlock, LocalBlockSink};
use crate::resolution::BlockResolver;
use crate::whitelist::{Exemption, ExemptionKey, WhitelistStore};

/// Placing, modifying, removing and listing global blocks
pub struct GlobalBlockService {
    pub(super) store: GlobalBlockStore,
    pub(super) whitelist: WhitelistStore,
    pub(super) identity: Arc<dyn CentralIdLookup>,
    pub(super) config: BlockingConfig,
    resolver: Arc<BlockResolver>,
    local_blocks: Arc<dyn LocalBlockSink>,
}

impl GlobalBlockService {
    pub fn new(
        db: DatabaseConnection,
        identity: Arc<dyn CentralIdLookup>,
        local_blocks: Arc<dyn LocalBlockSink>,
        config: BlockingConfig,
    ) -> Self {
        let resolver = Arc::new(BlockResolver::new(
            db.clone(),
            identity.clone(),
            config.clone(),
        ));
        Self {
            store: GlobalBlockStore::new(db.clone()),
            whitelist: WhitelistStore::new(db),
            identity,
            config,
            resolver,
            local_blocks,
        }
    }

    pub fn resolver(&self) -> Arc<BlockResolver> {
        self.resolver.clone()
    }

    pub async fn purge_expired(&self) -> Result<PurgeStats, GblockError> {
        self.store.purge_expired(self.config.purge_batch_size).await
    }

    /// Turns request text into a target: an address, a range within the
    /// CIDR limit or the canonical name of a known account.
    pub async fn validate_target(&self, input: &str) -> Result<BlockTarget, RequestError> {
        match RawTarget::parse(input) {
            RawTarget::Ip(ip) => Ok(BlockTarget::Ip(ip)),
            RawTarget::Range(net) => Ok(BlockTarget::Range(self.config.cidr_limit.check(&net)?)),
            RawTarget::Name(name) => {
                let invalid = || RequestError::InvalidTarget(input.trim().to_owned());
                let name = self
                    .identity
                    .canonicalize_name(&name)
                    .await?
                    .ok_or_else(invalid)?;
                let central_id = self
                    .identity
                    .central_id_from_name(&name)
                    .await?
                    .ok_or_else(invalid)?;
                Ok(BlockTarget::User { name, central_id })
            }
        }
    }

    pub async fn place_block(
        &self,
        request: PlaceBlock,
        performer: &Performer,
    ) -> Result<PlacedBlock, RequestError> {
        self.purge_expired().await?;

        let now = Utc::now();
        let expiry = Expiry::parse(&request.expiry, now)?;
        let target = self.validate_target(&request.target).await?;

        let existing = match self.store.find_by_target(&target).await? {
            Some(record) if !Expiry::from_column(record.expires_at).is_active_at(now) => {
                // dead rows still hold the unique address until purged
                self.store.delete(record.id).await?;
                None
            }
            existing => existing,
        };
        if existing.is_some() && !request.modify {
            return Err(RequestError::AlreadyBlocked(target.to_string()));
        }

        let bounds = target.bounds();
        let row = GlobalBlock::ActiveModel {
            address: Set(target.address()),
            target_central_id: Set(target.central_id()),
            by_name: Set(performer.name.clone()),
            by_central_id: Set(performer.central_id),
            by_site: Set(self.config.site_id.clone()),
            reason: Set(request.reason.clone()),
            created_at: Set(now),
            expires_at: Set(expiry.to_column()),
            anon_only: Set(request.anon_only),
            range_start: Set(bounds.as_ref().map(|b| b.start.clone()).unwrap_or_default()),
            range_end: Set(bounds.map(|b| b.end).unwrap_or_default()),
            ..Default::default()
        };

        let (id, modified) = match existing {
            Some(record) => {
                if self.store.update(record.id, row).await? == 0 {
                    warn!(block_target = %target, "Global block update affected no rows");
                    return Err(RequestError::RaceConditionFailure(target.to_string()));
                }
                (record.id, true)
            }
            None => {
                if self.store.insert(row).await? == 0 {
                    warn!(block_target = %target, "Global block insert affected no rows");
                    return Err(RequestError::RaceConditionFailure(target.to_string()));
                }
                let id = self
                    .store
                    .find_id(&target)
                    .await?
                    .ok_or(GblockError::InconsistentState)?;
                (id, false)
            }
        };

        info!(
            block_id = id,
            block_target = %target,
            performer = %performer.name,
            expiry = %expiry,
            anon_only = request.anon_only,
            modified,
            "Global block placed"
        );

        Ok(PlacedBlock {
            id,
            target,
            expiry,
            anon_only: request.anon_only,
            modified,
        })
    }

    pub async fn remove_block(
        &self,
        target: &str,
        performer: &Performer,
    ) -> Result<RemovedBlock, RequestError> {
        self.purge_expired().await?;

        let target = self.validate_target(target).await?;
        let Some(id) = self.store.find_id(&target).await? else {
            return Err(RequestError::NotBlocked(target.to_string()));
        };
        if self.store.delete(id).await? == 0 {
            return Err(RequestError::NotBlocked(target.to_string()));
        }

        info!(
            block_id = id,
            block_target = %target,
            performer = %performer.name,
            "Global block removed"
        );
        Ok(RemovedBlock { id, target })
    }

    /// Whether a non-exempted block currently applies to `target`.
    async fn has_effective_block(&self, target: &str) -> Result<bool, RequestError> {
        let central_id = match RawTarget::parse(target) {
            RawTarget::Name(name) => match self.identity.canonicalize_name(&name).await? {
                Some(name) => self.identity.central_id_from_name(&name).await?,
                None => None,
            },
            _ => None,
        };
        Ok(self
            .resolver
            .resolve(target, central_id, LookupFlags::default())
            .await?
            .is_some())
    }

    /// Entry point for API requests: exactly one of `expiry` and `unblock`,
    /// optional mirroring to a local block.
    pub async fn handle_request(
        &self,
        request: GlobalBlockRequest,
        performer: &Performer,
    ) -> Result<GlobalBlockOutcome, RequestError> {
        match (request.expiry, request.unblock) {
            (Some(_), true) | (None, false) => Err(RequestError::InvalidParameters(
                "exactly one of expiry and unblock must be given",
            )),
            (None, true) => {
                self.remove_block(&request.target, performer).await?;
                Ok(GlobalBlockOutcome::Unblocked {
                    target: request.target,
                })
            }
            (Some(expiry), false) => {
                let modify = request.modify && self.has_effective_block(&request.target).await?;
                let placed = self
                    .place_block(
                        PlaceBlock {
                            target: request.target.clone(),
                            expiry,
                            reason: request.reason.clone(),
                            anon_only: request.anon_only,
                            modify,
                        },
                        performer,
                    )
                    .await?;

                if request.also_local_block {
                    self.local_blocks
                        .place_local_block(LocalBlock {
                            target: placed.target.clone(),
                            expiry: placed.expiry,
                            reason: request.reason,
                            performer: performer.name.clone(),
                            block_talk_edit: request.local_block_talk_edit,
                            anon_only: request.local_anon_only,
                            modify: request.modify,
                        })
                        .await?;
                }

                Ok(GlobalBlockOutcome::Blocked {
                    target: request.target,
                    anon_only: placed.anon_only,
                    expiry: placed.expiry,
                    blocked_locally: request.also_local_block,
                })
            }
        }
    }

    /// The local exemption recorded for a target, if any.
    pub async fn whitelist_status(&self, target: &str) -> Result<Option<Exemption>, RequestError> {
        let target = self.validate_target(target).await?;
        Ok(self
            .whitelist
            .lookup(ExemptionKey::for_target(&target))
            .await?)
    }
}
