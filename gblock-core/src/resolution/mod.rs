//! Decides which global block, if any, applies to an actor.

mod cache;
mod forwarded;
mod notice;
mod specificity;

use std::collections::BTreeMap;
use std::sync::Arc;

use gblock_common::address::{RangeBounds, RawTarget};
use gblock_common::{BlockingConfig, CentralId, GblockError};
use gblock_db_entities::GlobalBlock;
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info};

pub use cache::RequestBlockCache;
pub use forwarded::parse_forwarded_for;
pub use notice::{BlockDetails, BlockNotice, BlockStatus, ForwardedBlockNotice};
pub use specificity::{BlockKind, Specificity};

use crate::blocks::{GlobalBlockStore, LookupFlags};
use crate::identity::{Actor, CentralIdLookup};
use crate::whitelist::WhitelistStore;

/// The winning record of a direct resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedBlock {
    pub kind: BlockKind,
    pub record: GlobalBlock::Model,
}

pub struct BlockResolver {
    store: GlobalBlockStore,
    whitelist: WhitelistStore,
    identity: Arc<dyn CentralIdLookup>,
    config: BlockingConfig,
}

impl BlockResolver {
    pub fn new(
        db: DatabaseConnection,
        identity: Arc<dyn CentralIdLookup>,
        config: BlockingConfig,
    ) -> Self {
        Self {
            store: GlobalBlockStore::new(db.clone()),
            whitelist: WhitelistStore::new(db),
            identity,
            config,
        }
    }

    /// The most specific active, non-exempted block on `target` (an address
    /// or a range) or on the account `central_id`.
    pub async fn resolve(
        &self,
        target: &str,
        central_id: Option<CentralId>,
        flags: LookupFlags,
    ) -> Result<Option<MatchedBlock>, GblockError> {
        let bounds = RawTarget::parse(target).bounds();
        let central_id = central_id.filter(|_| self.config.apply_username_blocks);

        let candidates = self
            .store
            .find_candidates(bounds.as_ref(), central_id, flags)
            .await?;
        self.most_specific(candidates).await
    }

    async fn most_specific(
        &self,
        candidates: Vec<GlobalBlock::Model>,
    ) -> Result<Option<MatchedBlock>, GblockError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
        let exempted = self.whitelist.exempted_block_ids(&ids).await?;

        let mut best: Option<(specificity::Specificity, MatchedBlock)> = None;
        for record in candidates {
            if exempted.contains(&record.id) {
                debug!(block_id = record.id, "Global block is locally exempted");
                continue;
            }
            let kind = BlockKind::of(&record).inspect_err(|error| {
                error!(%error, "Corrupt global block record");
            })?;
            let score = kind.specificity();
            let better = match &best {
                None => true,
                Some((best_score, best_match)) => {
                    (score, record.id) < (*best_score, best_match.record.id)
                }
            };
            if better {
                best = Some((score, MatchedBlock { kind, record }));
            }
        }

        Ok(best.map(|(_, matched)| matched))
    }

    /// Full check for an actor: own address and account first, then the
    /// forwarded-for chain. Memoized in `cache`.
    pub async fn resolve_actor(
        &self,
        actor: &Actor,
        forwarded_for: &[String],
        cache: &RequestBlockCache,
    ) -> Result<BlockStatus, GblockError> {
        cache
            .get_or_try_resolve(|| self.compute_status(actor, forwarded_for))
            .await
    }

    async fn compute_status(
        &self,
        actor: &Actor,
        forwarded_for: &[String],
    ) -> Result<BlockStatus, GblockError> {
        if !self.config.apply_global_blocks {
            return Ok(BlockStatus::NotBlocked);
        }

        let flags = LookupFlags {
            exclude_ip_blocks: actor.ip_block_exempt,
            exclude_anon_only: actor.is_registered(),
        };
        let central_id = if self.config.apply_username_blocks && actor.is_registered() {
            self.identity.central_id_from_local_actor(actor).await?
        } else {
            None
        };

        if let Some(matched) = self.resolve(&actor.ip, central_id, flags).await? {
            let notice = BlockNotice::new(matched.kind, &matched.record, &actor.ip);
            info!(
                ip = %actor.ip,
                user = ?actor.user_name,
                block_id = notice.block.id,
                block_target = %notice.block.target,
                "Actor is globally blocked"
            );
            return Ok(BlockStatus::Blocked(notice));
        }

        if self.config.block_forwarded_for {
            if let Some(notice) = self
                .resolve_forwarded(forwarded_for, flags.exclude_anon_only)
                .await?
            {
                info!(
                    ip = %actor.ip,
                    forwarded_address = %notice.address,
                    block_id = notice.block.id,
                    "Forwarded-for address is globally blocked"
                );
                return Ok(BlockStatus::BlockedViaForwardedFor(notice));
            }
        }

        Ok(BlockStatus::NotBlocked)
    }

    /// Checks each valid chain entry and reports the first one, in chain
    /// order, that any surviving block covers.
    pub async fn resolve_forwarded(
        &self,
        chain: &[String],
        exclude_anon_only: bool,
    ) -> Result<Option<ForwardedBlockNotice>, GblockError> {
        let addresses = forwarded::valid_addresses(chain);
        if addresses.is_empty() {
            return Ok(None);
        }

        let flags = LookupFlags {
            exclude_ip_blocks: false,
            exclude_anon_only,
        };
        let mut matched = BTreeMap::new();
        for ip in &addresses {
            let bounds = RangeBounds::of_ip(*ip);
            for record in self
                .store
                .find_candidates(Some(&bounds), None, flags)
                .await?
            {
                matched.insert(record.id, record);
            }
        }
        if matched.is_empty() {
            return Ok(None);
        }

        let ids: Vec<_> = matched.keys().copied().collect();
        let exempted = self.whitelist.exempted_block_ids(&ids).await?;
        let surviving: Vec<_> = matched
            .into_values()
            .filter(|record| !exempted.contains(&record.id))
            .collect();

        match forwarded::first_covered(&addresses, &surviving) {
            Some((ip, record)) => {
                BlockKind::of(record)?;
                Ok(Some(ForwardedBlockNotice::new(ip, record)))
            }
            None => Ok(None),
        }
    }
}
