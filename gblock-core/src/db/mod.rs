use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use gblock_common::helpers::fs::secure_file;
use gblock_common::GblockConfig;
use gblock_db_migrations::migrate_database;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::*;
use url::Url;

const SQLITE_FILE_NAME: &str = "db.sqlite3";

/// Opens the configured database and brings its schema up to date.
///
/// A sqlite URL names a directory relative to the config file. The database
/// file inside it is created on first use and restricted to the owner.
pub async fn connect_to_db(config: &GblockConfig) -> Result<DatabaseConnection> {
    let mut url = Url::parse(config.store.database_url.expose_secret())
        .context("database_url is not a valid URL")?;

    let in_memory = url.scheme() == "sqlite" && url.path() == ":memory:";
    if url.scheme() == "sqlite" && !in_memory {
        let db_path = sqlite_file_path(config, &url);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        url.set_path(
            db_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to convert database path to string"))?,
        );
        url.set_query(Some("mode=rwc"));

        // touch the file so its permissions can be fixed before the pool opens it
        let db = Database::connect(ConnectOptions::new(url.to_string())).await?;
        db.execute_unprepared("SELECT 1").await?;
        db.close().await?;

        secure_file(&db_path)?;
        debug!(path = ?db_path, "Using sqlite database");
    }

    let mut opt = ConnectOptions::new(url.to_string());
    opt.connect_timeout(Duration::from_secs(8)).sqlx_logging(false);
    if in_memory {
        // every pooled connection would otherwise get its own empty database
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(32)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(60));
    }

    let connection = Database::connect(opt).await?;

    migrate_database(&connection).await?;
    info!(backend = ?connection.get_database_backend(), "Database ready");
    Ok(connection)
}

fn sqlite_file_path(config: &GblockConfig, url: &Url) -> PathBuf {
    let mut path = config.paths_relative_to.clone();
    path.push(url.path());
    path.push(SQLITE_FILE_NAME);
    path
}

#[cfg(test)]
mod tests {
    use gblock_common::GblockConfigStore;
    use gblock_common::Secret;

    use super::*;

    fn config(database_url: &str) -> GblockConfig {
        GblockConfig {
            store: GblockConfigStore {
                database_url: Secret::new(database_url.to_owned()),
                ..Default::default()
            },
            paths_relative_to: PathBuf::from("/etc/gblock"),
        }
    }

    #[test]
    fn test_sqlite_path_is_relative_to_config() {
        let config = config("sqlite:data/db");
        let url = Url::parse(config.store.database_url.expose_secret()).unwrap();
        assert_eq!(
            sqlite_file_path(&config, &url),
            PathBuf::from("/etc/gblock/data/db/db.sqlite3")
        );
    }

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = connect_to_db(&config("sqlite::memory:")).await.unwrap();
        db.execute_unprepared("SELECT COUNT(*) FROM global_blocks")
            .await
            .unwrap();
    }
}
