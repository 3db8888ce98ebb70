//! Settings-related commands
//!
//! Commands for reading and updating notification, storage and runtime
//! settings. Updates are validated and written to `settings.json`; they
//! take effect on the next start.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{NotificationSettings, RuntimeSettings, StorageSettings};

// ===== Notification Settings =====

/// Get current notification settings
pub async fn get_notification_settings(state: &AppState) -> Result<NotificationSettings> {
    state.settings_service.get_notifications().await
}

/// Update default texts, sound and permission behaviour
/// Note: Application restart required for changes to take effect
pub async fn update_notification_settings(
    state: &AppState,
    notifications: NotificationSettings,
) -> Result<()> {
    state
        .settings_service
        .update_notifications(notifications)
        .await?;

    tracing::warn!(
        "Notification settings updated. Application restart required for changes to take effect."
    );

    Ok(())
}

// ===== Storage Settings =====

/// Get current storage settings
pub async fn get_storage_settings(state: &AppState) -> Result<StorageSettings> {
    state.settings_service.get_storage().await
}

/// Switch storage backend or key; alarms are not migrated
pub async fn update_storage_settings(state: &AppState, storage: StorageSettings) -> Result<()> {
    state.settings_service.update_storage(storage).await
}

// ===== Runtime Settings =====

/// Get current runtime settings
pub async fn get_runtime_settings(state: &AppState) -> Result<RuntimeSettings> {
    state.settings_service.get_runtime().await
}

/// Update the per-call timeout
/// Note: Application restart required for changes to take effect
pub async fn update_runtime_settings(state: &AppState, runtime: RuntimeSettings) -> Result<()> {
    state.settings_service.update_runtime(runtime).await?;

    tracing::warn!(
        "Runtime settings updated. Application restart required for changes to take effect."
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::setup;
    use crate::error::AppError;
    use crate::services::StorageBackend;
    use tempfile::TempDir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notification_settings_round_trip_through_setup() {
        let temp_dir = TempDir::new().unwrap();
        let (state, _scheduler) = setup(temp_dir.path().to_path_buf()).await.unwrap();

        let mut notifications = get_notification_settings(&state).await.unwrap();
        assert!(notifications.allow_notifications);

        notifications.default_title = "Despierta".to_string();
        notifications.sound_enabled = false;
        update_notification_settings(&state, notifications.clone())
            .await
            .unwrap();
        assert_eq!(get_notification_settings(&state).await.unwrap(), notifications);

        // A restart picks the new defaults up
        let (restarted, _scheduler) = setup(temp_dir.path().to_path_buf()).await.unwrap();
        assert_eq!(restarted.settings.notifications.default_title, "Despierta");
        assert!(!restarted.settings.notifications.content_defaults().sound);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_updates_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (state, _scheduler) = setup(temp_dir.path().to_path_buf()).await.unwrap();

        let result = update_runtime_settings(
            &state,
            RuntimeSettings {
                operation_timeout_ms: 60_001,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = update_storage_settings(
            &state,
            StorageSettings {
                backend: StorageBackend::Sqlite,
                key: "  ".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        assert_eq!(get_runtime_settings(&state).await.unwrap(), RuntimeSettings::default());
        assert_eq!(get_storage_settings(&state).await.unwrap(), StorageSettings::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_storage_switch_applies_on_next_start() {
        let temp_dir = TempDir::new().unwrap();
        let (state, _scheduler) = setup(temp_dir.path().to_path_buf()).await.unwrap();

        update_storage_settings(
            &state,
            StorageSettings {
                backend: StorageBackend::Sqlite,
                key: "@alarms".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(state.settings.storage.backend, StorageBackend::Json);

        let (restarted, _scheduler) = setup(temp_dir.path().to_path_buf()).await.unwrap();
        assert_eq!(restarted.settings.storage.backend, StorageBackend::Sqlite);
    }
}
