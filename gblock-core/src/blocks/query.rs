use chrono::{DateTime, Utc};
use gblock_common::address::RangeBounds;
use gblock_common::CentralId;
use gblock_db_entities::GlobalBlock;
use sea_orm::{ColumnTrait, Condition};

/// Capability flags supplied by whoever asks for a resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LookupFlags {
    /// Skip address and range blocks entirely
    pub exclude_ip_blocks: bool,
    /// Skip anon-only address and range blocks (registered actors)
    pub exclude_anon_only: bool,
}

pub(crate) fn active_condition(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(GlobalBlock::Column::ExpiresAt.is_null())
        .add(GlobalBlock::Column::ExpiresAt.gt(now))
}

pub(crate) fn expired_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(GlobalBlock::Column::ExpiresAt.is_not_null())
        .add(GlobalBlock::Column::ExpiresAt.lte(now))
}

/// Records whose range covers all of `bounds`.
pub(crate) fn containment_condition(bounds: &RangeBounds, exclude_anon_only: bool) -> Condition {
    let condition = Condition::all()
        .add(GlobalBlock::Column::RangeStart.lte(bounds.start.as_str()))
        .add(GlobalBlock::Column::RangeEnd.gte(bounds.end.as_str()));
    if exclude_anon_only {
        condition.add(GlobalBlock::Column::AnonOnly.eq(false))
    } else {
        condition
    }
}

/// Address side OR user side. `None` when there is nothing to match.
pub(crate) fn candidate_condition(
    bounds: Option<&RangeBounds>,
    central_id: Option<CentralId>,
    flags: LookupFlags,
) -> Option<Condition> {
    let address_condition = bounds
        .filter(|_| !flags.exclude_ip_blocks)
        .map(|bounds| containment_condition(bounds, flags.exclude_anon_only));
    let user_condition = central_id
        .filter(|id| *id > 0)
        .map(|id| Condition::all().add(GlobalBlock::Column::TargetCentralId.eq(id)));

    match (address_condition, user_condition) {
        (None, None) => None,
        (Some(address), None) => Some(address),
        (None, Some(user)) => Some(user),
        (Some(address), Some(user)) => Some(Condition::any().add(user).add(address)),
    }
}
