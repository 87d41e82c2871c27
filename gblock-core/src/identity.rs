use std::collections::BTreeMap;

use async_trait::async_trait;
use gblock_common::address::canonical_username;
use gblock_common::{CentralId, GblockError};

/// Whoever a resolution is being performed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Address the request came from, as text
    pub ip: String,
    /// Local account name for registered actors
    pub user_name: Option<String>,
    /// The host has granted this actor an exemption from IP-based blocks
    pub ip_block_exempt: bool,
}

impl Actor {
    pub fn anonymous(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_name: None,
            ip_block_exempt: false,
        }
    }

    pub fn registered(ip: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_name: Some(user_name.into()),
            ip_block_exempt: false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.user_name.is_some()
    }
}

/// The host's shared identity system.
#[async_trait]
pub trait CentralIdLookup: Send + Sync {
    async fn canonicalize_name(&self, name: &str) -> Result<Option<String>, GblockError>;

    async fn central_id_from_name(&self, name: &str) -> Result<Option<CentralId>, GblockError>;

    async fn central_id_from_local_actor(
        &self,
        actor: &Actor,
    ) -> Result<Option<CentralId>, GblockError>;
}

/// Identity lookup backed by the `central_ids` table in the config file.
pub struct StaticCentralIdLookup {
    ids: BTreeMap<String, CentralId>,
}

impl StaticCentralIdLookup {
    pub fn new(ids: &BTreeMap<String, CentralId>) -> Self {
        let ids = ids
            .iter()
            .filter(|(_, id)| **id > 0)
            .filter_map(|(name, id)| canonical_username(name).map(|name| (name, *id)))
            .collect();
        Self { ids }
    }
}

#[async_trait]
impl CentralIdLookup for StaticCentralIdLookup {
    async fn canonicalize_name(&self, name: &str) -> Result<Option<String>, GblockError> {
        Ok(canonical_username(name))
    }

    async fn central_id_from_name(&self, name: &str) -> Result<Option<CentralId>, GblockError> {
        Ok(canonical_username(name).and_then(|name| self.ids.get(&name).copied()))
    }

    async fn central_id_from_local_actor(
        &self,
        actor: &Actor,
    ) -> Result<Option<CentralId>, GblockError> {
        match &actor.user_name {
            Some(name) => self.central_id_from_name(name).await,
            None => Ok(None),
        }
    }
}
