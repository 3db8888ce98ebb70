//! SQLite-backed key-value store

use super::KeyValueStore;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[derive(Clone)]
pub struct SqliteStore {
    repo: Repository,
}

impl SqliteStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (or create) the database file and run migrations
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = create_pool(db_path).await?;
        Ok(Self::new(Repository::new(pool)))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.repo.get_value(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.repo.set_value(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.repo.delete_value(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("alarms.db");

        {
            let store = SqliteStore::open(&db_path).await.unwrap();
            store.set_item("@alarms", "[]").await.unwrap();
        }

        let store = SqliteStore::open(&db_path).await.unwrap();
        assert_eq!(store.get_item("@alarms").await.unwrap().as_deref(), Some("[]"));

        store.remove_item("@alarms").await.unwrap();
        assert!(store.get_item("@alarms").await.unwrap().is_none());
    }
}
