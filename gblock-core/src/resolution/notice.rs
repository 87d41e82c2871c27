use std::net::IpAddr;

use chrono::{DateTime, Utc};
use gblock_common::expiry::Expiry;
use gblock_common::BlockId;
use gblock_db_entities::GlobalBlock;

use super::BlockKind;

/// Record fields shown to a blocked actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDetails {
    pub id: BlockId,
    pub target: String,
    pub by_name: String,
    pub by_site: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expiry: Expiry,
    pub anon_only: bool,
}

impl From<&GlobalBlock::Model> for BlockDetails {
    fn from(record: &GlobalBlock::Model) -> Self {
        Self {
            id: record.id,
            target: record.address.clone(),
            by_name: record.by_name.clone(),
            by_site: record.by_site.clone(),
            reason: record.reason.clone(),
            created_at: record.created_at,
            expiry: Expiry::from_column(record.expires_at),
            anon_only: record.anon_only,
        }
    }
}

impl BlockDetails {
    fn describe_expiry(&self) -> String {
        match self.expiry {
            Expiry::Infinite => "never".to_owned(),
            expiry => expiry.to_string(),
        }
    }

    fn tail(&self) -> String {
        format!(
            "by {} ({}). The reason given is: {}. This block expires: {}.",
            self.by_name,
            self.by_site,
            self.reason,
            self.describe_expiry()
        )
    }
}

/// A block on the actor's own address or account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockNotice {
    pub kind: BlockKind,
    pub block: BlockDetails,
    pub message: String,
}

impl BlockNotice {
    pub(crate) fn new(kind: BlockKind, record: &GlobalBlock::Model, actor_ip: &str) -> Self {
        let block = BlockDetails::from(record);
        let message = match kind {
            BlockKind::User => format!(
                "Your account has been blocked on all sites {}",
                block.tail()
            ),
            BlockKind::Address => format!(
                "Your IP address {actor_ip} has been blocked on all sites {}",
                block.tail()
            ),
            BlockKind::Range(range) => format!(
                "Your IP address {actor_ip} is in the range {range}, which has been blocked on all sites {}",
                block.tail()
            ),
        };
        Self {
            kind,
            block,
            message,
        }
    }
}

/// A block matched through the forwarded-for chain rather than the actor
/// itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardedBlockNotice {
    /// The chain entry that fell inside the block
    pub address: IpAddr,
    pub block: BlockDetails,
    pub message: String,
}

impl ForwardedBlockNotice {
    pub(crate) fn new(address: IpAddr, record: &GlobalBlock::Model) -> Self {
        let block = BlockDetails::from(record);
        let message = format!(
            "One of the addresses your request was forwarded for ({address}) has been blocked on all sites {}",
            block.tail()
        );
        Self {
            address,
            block,
            message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockStatus {
    NotBlocked,
    Blocked(BlockNotice),
    BlockedViaForwardedFor(ForwardedBlockNotice),
}

impl BlockStatus {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, Self::NotBlocked)
    }
}
