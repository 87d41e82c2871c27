use chrono::{DateTime, Utc};
use gblock_core::resolution::{BlockDetails, BlockKind};
use gblock_core::whitelist::Exemption;
use poem_openapi::{Enum, Object};

#[derive(Enum, Debug, PartialEq, Eq)]
#[oai(rename_all = "snake_case")]
pub enum TargetKind {
    User,
    Address,
    Range,
}

impl From<BlockKind> for TargetKind {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::User => Self::User,
            BlockKind::Address => Self::Address,
            BlockKind::Range(_) => Self::Range,
        }
    }
}

#[derive(Object, Debug)]
pub struct BlockInfo {
    pub id: i32,
    pub target: String,
    pub by_name: String,
    pub by_site: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    /// `infinite` or an RFC 3339 timestamp
    pub expiry: String,
    pub anon_only: bool,
}

impl From<BlockDetails> for BlockInfo {
    fn from(block: BlockDetails) -> Self {
        Self {
            id: block.id,
            target: block.target,
            by_name: block.by_name,
            by_site: block.by_site,
            reason: block.reason,
            created_at: block.created_at,
            expiry: block.expiry.to_string(),
            anon_only: block.anon_only,
        }
    }
}

#[derive(Object, Debug)]
pub struct ExemptionInfo {
    pub block_id: i32,
    pub granted_by: String,
    pub reason: String,
    pub expiry: String,
}

impl From<Exemption> for ExemptionInfo {
    fn from(exemption: Exemption) -> Self {
        Self {
            block_id: exemption.block_id,
            granted_by: exemption.granted_by,
            reason: exemption.reason,
            expiry: exemption.expiry.to_string(),
        }
    }
}
