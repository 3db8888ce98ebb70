//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    ALARMS_STORAGE_KEY, DEFAULT_ALARM_BODY, DEFAULT_ALARM_TITLE, DEFAULT_OPERATION_TIMEOUT_MS,
    MAX_OPERATION_TIMEOUT_MS, MIN_OPERATION_TIMEOUT_MS, SETTINGS_FILE_NAME,
};
use crate::database::ContentDefaults;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Notification content and permission behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Whether fired alarms play a sound
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Title used for alarms without a name
    #[serde(default = "default_title")]
    pub default_title: String,
    /// Body used for alarms without a description
    #[serde(default = "default_body")]
    pub default_body: String,
    /// Answer given when notification permission is requested
    #[serde(default = "default_true")]
    pub allow_notifications: bool,
}

fn default_true() -> bool {
    true
}

fn default_title() -> String {
    DEFAULT_ALARM_TITLE.to_string()
}

fn default_body() -> String {
    DEFAULT_ALARM_BODY.to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            default_title: default_title(),
            default_body: default_body(),
            allow_notifications: true,
        }
    }
}

impl NotificationSettings {
    pub fn content_defaults(&self) -> ContentDefaults {
        ContentDefaults {
            title: self.default_title.clone(),
            body: self.default_body.clone(),
            sound: self.sound_enabled,
        }
    }
}

/// Where the alarm list is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Key holding the serialized alarm list
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_key() -> String {
    ALARMS_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            key: default_storage_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Upper bound on each scheduler or store call
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

fn default_operation_timeout() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_MS
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl RuntimeSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl AppSettings {
    pub fn validate(&self) -> Result<()> {
        let timeout = self.runtime.operation_timeout_ms;
        if !(MIN_OPERATION_TIMEOUT_MS..=MAX_OPERATION_TIMEOUT_MS).contains(&timeout) {
            return Err(AppError::Validation(format!(
                "Operation timeout must be between {} and {} ms",
                MIN_OPERATION_TIMEOUT_MS, MAX_OPERATION_TIMEOUT_MS
            )));
        }

        if self.storage.key.trim().is_empty() {
            return Err(AppError::Validation(
                "Storage key must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_notifications(&self) -> Result<NotificationSettings> {
        Ok(self.load().await?.notifications)
    }

    pub async fn update_notifications(&self, notifications: NotificationSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.notifications = notifications;
        self.save(&settings).await
    }

    pub async fn get_storage(&self) -> Result<StorageSettings> {
        Ok(self.load().await?.storage)
    }

    /// Takes effect on the next start
    pub async fn update_storage(&self, storage: StorageSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.storage = storage;
        self.save(&settings).await?;
        tracing::warn!("Storage settings updated. Restart required for changes to take effect.");
        Ok(())
    }

    pub async fn get_runtime(&self) -> Result<RuntimeSettings> {
        Ok(self.load().await?.runtime)
    }

    pub async fn update_runtime(&self, runtime: RuntimeSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.runtime = runtime;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert!(temp.path().join(SETTINGS_FILE_NAME).exists());
        assert!(settings.notifications.sound_enabled);
        assert!(settings.notifications.allow_notifications);
        assert_eq!(settings.notifications.default_title, "Alarma");
        assert_eq!(settings.notifications.default_body, "¡Es hora!");
        assert_eq!(settings.storage.backend, StorageBackend::Json);
        assert_eq!(settings.storage.key, "@alarms");
        assert_eq!(settings.runtime.operation_timeout_ms, 5_000);
    }

    #[tokio::test]
    async fn test_missing_sections_use_defaults() {
        let (service, temp) = create_test_service();
        fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{"storage": {"backend": "sqlite"}}"#,
        )
        .await
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.storage.backend, StorageBackend::Sqlite);
        assert_eq!(settings.storage.key, "@alarms");
        assert_eq!(settings.notifications, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_notification_settings_persist() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            service
                .update_notifications(NotificationSettings {
                    sound_enabled: false,
                    default_title: "Wake up".to_string(),
                    default_body: "Time to get up".to_string(),
                    allow_notifications: true,
                })
                .await
                .unwrap();
        }

        let service = SettingsService::new(temp_dir.path().to_path_buf());
        let loaded = service.get_notifications().await.unwrap();
        assert!(!loaded.sound_enabled);
        assert_eq!(loaded.default_title, "Wake up");

        let defaults = loaded.content_defaults();
        assert_eq!(defaults.body, "Time to get up");
        assert!(!defaults.sound);
    }

    #[tokio::test]
    async fn test_storage_update_keeps_notifications() {
        let (service, _temp) = create_test_service();

        service
            .update_storage(StorageSettings {
                backend: StorageBackend::Memory,
                key: "@alarms".to_string(),
            })
            .await
            .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert_eq!(settings.notifications, NotificationSettings::default());
        assert_eq!(service.get_storage().await.unwrap().backend, StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_out_of_range_timeout_rejected() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_runtime(RuntimeSettings {
                operation_timeout_ms: 10,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let settings = service.load().await.unwrap();
        assert_eq!(settings.runtime.operation_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
    }
}
