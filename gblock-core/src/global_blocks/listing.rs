use std::collections::HashSet;

use chrono::Utc;
use gblock_common::address::{RangeBounds, RawTarget};
use gblock_db_entities::GlobalBlock;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::request::RequestError;
use super::GlobalBlockService;
use crate::blocks::{active_condition, containment_condition};
use crate::whitelist::Exemption;

const DEFAULT_LIMIT: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HiddenBlockKind {
    Temporary,
    Indefinite,
    Address,
    Range,
    User,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockListQuery {
    /// Address, range or user name to narrow the list to
    pub target: Option<String>,
    pub hide: HashSet<HiddenBlockKind>,
    pub offset: u64,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedBlock {
    pub record: GlobalBlock::Model,
    /// Present when the local site has exempted this block
    pub exemption: Option<Exemption>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockListPage {
    pub items: Vec<ListedBlock>,
    pub offset: u64,
    pub total: u64,
}

impl BlockListQuery {
    fn hides_everything(&self) -> bool {
        let hidden = |kind| self.hide.contains(&kind);
        (hidden(HiddenBlockKind::Address)
            && hidden(HiddenBlockKind::Range)
            && hidden(HiddenBlockKind::User))
            || (hidden(HiddenBlockKind::Temporary) && hidden(HiddenBlockKind::Indefinite))
    }

    fn hide_condition(&self) -> Condition {
        self.hide
            .iter()
            .fold(Condition::all(), |condition, kind| match kind {
                HiddenBlockKind::Temporary => {
                    condition.add(GlobalBlock::Column::ExpiresAt.is_null())
                }
                HiddenBlockKind::Indefinite => {
                    condition.add(GlobalBlock::Column::ExpiresAt.is_not_null())
                }
                HiddenBlockKind::User => {
                    condition.add(GlobalBlock::Column::TargetCentralId.is_null())
                }
                // ranges are stored in CIDR notation, single addresses are not
                HiddenBlockKind::Range => {
                    condition.add(GlobalBlock::Column::Address.not_like("%/%"))
                }
                HiddenBlockKind::Address => condition.add(
                    Condition::any()
                        .add(GlobalBlock::Column::TargetCentralId.is_not_null())
                        .add(GlobalBlock::Column::Address.like("%/%")),
                ),
            })
    }
}

impl GlobalBlockService {
    /// Active blocks, newest first, with their local exemption status.
    pub async fn list_blocks(&self, query: BlockListQuery) -> Result<BlockListPage, RequestError> {
        self.purge_expired().await?;

        let empty = BlockListPage {
            items: vec![],
            offset: query.offset,
            total: 0,
        };
        if query.hides_everything() {
            return Ok(empty);
        }

        let mut select = GlobalBlock::Entity::find()
            .filter(active_condition(Utc::now()))
            .filter(query.hide_condition());

        if let Some(target) = query.target.as_deref().map(str::trim) {
            if !target.is_empty() {
                select = match RawTarget::parse(target) {
                    RawTarget::Ip(ip) => {
                        select.filter(containment_condition(&RangeBounds::of_ip(ip), false))
                    }
                    RawTarget::Range(net) => {
                        select.filter(GlobalBlock::Column::Address.eq(net.trunc().to_string()))
                    }
                    RawTarget::Name(name) => {
                        let Some(name) = self.identity.canonicalize_name(&name).await? else {
                            return Err(RequestError::InvalidTarget(target.to_owned()));
                        };
                        let Some(central_id) = self.identity.central_id_from_name(&name).await?
                        else {
                            return Ok(empty);
                        };
                        select.filter(GlobalBlock::Column::TargetCentralId.eq(central_id))
                    }
                };
            }
        }

        let select = select
            .order_by_desc(GlobalBlock::Column::CreatedAt)
            .order_by_desc(GlobalBlock::Column::Id);

        let db = self.store.connection();
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        let total = select.clone().paginate(db, limit.max(1)).num_items().await?;

        let records = select.offset(query.offset).limit(limit).all(db).await?;
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        let mut exemptions = self.whitelist.lookup_many(&ids).await?;

        let items = records
            .into_iter()
            .map(|record| ListedBlock {
                exemption: exemptions.remove(&record.id),
                record,
            })
            .collect();

        Ok(BlockListPage {
            items,
            offset: query.offset,
            total,
        })
    }
}
