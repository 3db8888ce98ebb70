//! Storage module
//!
//! Key-value persistence for the alarm list. The whole list lives under one
//! key and is rewritten on every save.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::database::Alarm;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// String-keyed durable storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// The alarm list mirrored into a [`KeyValueStore`]
#[derive(Clone)]
pub struct AlarmStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl AlarmStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Read the persisted list; an absent key is an empty list
    pub async fn load(&self) -> Result<Vec<Alarm>> {
        match self.backend.get_item(&self.key).await? {
            Some(raw) => {
                let alarms: Vec<Alarm> = serde_json::from_str(&raw)?;
                tracing::debug!("Loaded {} alarms from {}", alarms.len(), self.key);
                Ok(alarms)
            }
            None => {
                tracing::debug!("No alarms stored under {}", self.key);
                Ok(Vec::new())
            }
        }
    }

    /// Replace the persisted list
    pub async fn save(&self, alarms: &[Alarm]) -> Result<()> {
        let raw = serde_json::to_string(alarms)?;
        self.backend.set_item(&self.key, &raw).await?;
        tracing::debug!("Saved {} alarms to {}", alarms.len(), self.key);
        Ok(())
    }
}
