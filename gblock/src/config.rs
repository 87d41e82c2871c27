use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use gblock_common::helpers::fs::secure_file;
use gblock_common::{GblockConfig, GblockConfigStore};
use tracing::*;

pub fn load_config(path: &Path, secure: bool) -> Result<GblockConfig> {
    if secure {
        secure_file(path).context("Could not secure config")?;
    }

    let store: GblockConfigStore = Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix("GBLOCK").separator("__"))
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    let config = GblockConfig {
        store,
        paths_relative_to: path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    info!(
        "Using config: {path:?} (site: {}, known accounts: {})",
        config.store.blocking.site_id,
        config.store.central_ids.len(),
    );
    Ok(config)
}
