//! Application state and initialization
//!
//! This module wires settings, storage, the notification scheduler and
//! the alarm manager together. All commands operate on AppState.

use crate::config::{
    DATABASE_FILE_NAME, DATA_DIR_ENV, DEFAULT_DATA_DIR_NAME, KEY_VALUE_FILE_NAME,
};
use crate::error::Result;
use crate::services::{
    AlarmManager, AppSettings, CronNotificationScheduler, NotificationScheduler, SettingsService,
    StorageBackend, StorageSettings, TracingNotifier,
};
use crate::storage::{AlarmStore, JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: AppSettings,
    pub settings_service: SettingsService,
    pub scheduler: Arc<dyn NotificationScheduler>,
    pub alarms: Arc<Mutex<AlarmManager>>,
}

impl AppState {
    pub fn new(
        app_data_dir: PathBuf,
        settings: AppSettings,
        store: AlarmStore,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        let manager = AlarmManager::new(store, Arc::clone(&scheduler))
            .with_content_defaults(settings.notifications.content_defaults())
            .with_operation_timeout(settings.runtime.operation_timeout());

        Self {
            settings_service: SettingsService::new(app_data_dir.clone()),
            app_data_dir,
            settings,
            scheduler,
            alarms: Arc::new(Mutex::new(manager)),
        }
    }
}

/// Data directory from the environment, else `~/.alarmclock`
pub fn resolve_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DATA_DIR_NAME)
}

/// Open the configured storage backend
pub async fn open_store(app_data_dir: &Path, storage: &StorageSettings) -> Result<AlarmStore> {
    let backend: Arc<dyn KeyValueStore> = match storage.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(app_data_dir.join(KEY_VALUE_FILE_NAME))),
        StorageBackend::Sqlite => {
            Arc::new(SqliteStore::open(&app_data_dir.join(DATABASE_FILE_NAME)).await?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; alarms will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    tracing::info!("Alarm storage: {:?} (key {})", storage.backend, storage.key);
    Ok(AlarmStore::new(backend, storage.key.clone()))
}

/// Application setup - called once on startup.
///
/// Returns the state plus the concrete scheduler so the caller can start
/// and shut it down.
pub async fn setup(app_data_dir: PathBuf) -> Result<(AppState, Arc<CronNotificationScheduler>)> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(&app_data_dir)?;

    let settings = SettingsService::new(app_data_dir.clone()).load().await?;
    let store = open_store(&app_data_dir, &settings.storage).await?;

    let scheduler = Arc::new(
        CronNotificationScheduler::new(
            Arc::new(TracingNotifier),
            settings.notifications.allow_notifications,
        )
        .await?,
    );

    let state = AppState::new(
        app_data_dir,
        settings,
        store,
        Arc::clone(&scheduler) as Arc<dyn NotificationScheduler>,
    );

    tracing::info!("Application initialized successfully");

    Ok((state, scheduler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_setup_creates_settings_and_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let (state, scheduler) = setup(data_dir.clone()).await.unwrap();

        assert!(data_dir.join("settings.json").exists());
        assert_eq!(state.settings.storage.backend, StorageBackend::Json);

        let mut manager = state.alarms.lock().await;
        assert!(manager.load().await.unwrap().is_empty());
        assert_eq!(scheduler.registration_count().await, 0);
    }

    #[tokio::test]
    async fn test_open_sqlite_store() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageSettings {
            backend: StorageBackend::Sqlite,
            key: "@alarms".to_string(),
        };

        let store = open_store(temp_dir.path(), &storage).await.unwrap();
        store.save(&[]).await.unwrap();

        assert!(temp_dir.path().join(DATABASE_FILE_NAME).exists());
        assert!(store.load().await.unwrap().is_empty());
    }
}
