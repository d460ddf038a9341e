//! Where the collection lives.

use crate::db::SqliteRepository;
use anyhow::Context;
use std::path::PathBuf;

/// Environment variable naming the collection database.
pub const DB_ENV: &str = "DECKWISE_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
}

impl CliConfig {
    /// An explicit path wins over `DECKWISE_DB`, which wins over the
    /// platform data directory.
    pub fn from_env(path: Option<PathBuf>) -> Self {
        let db_path = path
            .or_else(|| std::env::var_os(DB_ENV).map(PathBuf::from))
            .unwrap_or_else(default_db_path);
        Self { db_path }
    }

    pub fn open_repository(&self) -> anyhow::Result<SqliteRepository> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        SqliteRepository::open(&self.db_path)
            .with_context(|| format!("opening {}", self.db_path.display()))
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deckwise")
        .join("collection.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn explicit_path_wins() {
        let config = CliConfig::from_env(Some(PathBuf::from("/tmp/explicit.db")));
        assert_eq!(config.db_path, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn default_path_ends_in_collection_db() {
        assert!(default_db_path().ends_with("deckwise/collection.db"));
    }
}
