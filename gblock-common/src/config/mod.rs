mod defaults;

use std::collections::BTreeMap;
use std::path::PathBuf;

use defaults::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::address::CidrLimit;
use crate::{CentralId, ListenEndpoint, Secret};

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct HttpConfig {
    #[serde(default = "_default_http_listen")]
    #[schemars(with = "String")]
    pub listen: ListenEndpoint,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: _default_http_listen(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct BlockingConfig {
    /// Master switch for resolution. When off, nobody is reported as blocked.
    #[serde(default = "_default_true")]
    pub apply_global_blocks: bool,

    #[serde(default = "_default_true")]
    pub apply_username_blocks: bool,

    /// Fall back to the forwarded-for chain when the direct address is clean.
    #[serde(default = "_default_true")]
    pub block_forwarded_for: bool,

    #[serde(default)]
    pub cidr_limit: CidrLimit,

    /// Upper bound on expired block rows removed per purge.
    #[serde(default = "_default_purge_batch_size")]
    pub purge_batch_size: u64,

    /// Recorded as the originating site of blocks placed through this instance.
    #[serde(default = "_default_site_id")]
    pub site_id: String,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            apply_global_blocks: true,
            apply_username_blocks: true,
            block_forwarded_for: true,
            cidr_limit: <_>::default(),
            purge_batch_size: _default_purge_batch_size(),
            site_id: _default_site_id(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct GblockConfigStore {
    #[serde(default = "_default_database_url")]
    #[schemars(with = "String")]
    pub database_url: Secret<String>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    /// Static name to central id table for deployments without an external
    /// identity service.
    #[serde(default)]
    pub central_ids: BTreeMap<String, CentralId>,
}

impl Default for GblockConfigStore {
    fn default() -> Self {
        Self {
            database_url: _default_database_url(),
            http: <_>::default(),
            blocking: <_>::default(),
            central_ids: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GblockConfig {
    pub store: GblockConfigStore,
    pub paths_relative_to: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let store: GblockConfigStore = serde_json::from_str("{}").unwrap();
        assert_eq!(store.database_url.expose_secret(), "sqlite:data/db");
        assert_eq!(store.http.listen.port(), 8888);
        assert!(store.blocking.apply_global_blocks);
        assert!(store.blocking.block_forwarded_for);
        assert_eq!(store.blocking.cidr_limit, CidrLimit::default());
        assert_eq!(store.blocking.purge_batch_size, 1000);
        assert_eq!(store.blocking.site_id, "local");
    }

    #[test]
    fn test_partial_overrides() {
        let store: GblockConfigStore = serde_json::from_str(
            r#"{
                "http": {"listen": "127.0.0.1:9000"},
                "blocking": {"cidr_limit": {"ipv4": 20}, "apply_username_blocks": false},
                "central_ids": {"Example": 7}
            }"#,
        )
        .unwrap();
        assert_eq!(store.http.listen.port(), 9000);
        assert_eq!(store.blocking.cidr_limit.ipv4, 20);
        assert_eq!(store.blocking.cidr_limit.ipv6, 19);
        assert!(!store.blocking.apply_username_blocks);
        assert_eq!(store.central_ids.get("Example"), Some(&7));
    }
}
