//! Alarm commands
//!
//! CRUD operations for daily alarms. Commands never wait for a running
//! operation: a second request while one is in flight gets `AppError::Busy`.

use crate::app::AppState;
use crate::config::{MAX_ALARM_DESCRIPTION_LENGTH, MAX_ALARM_NAME_LENGTH};
use crate::database::{Alarm, AlarmCounts};
use crate::error::{AppError, Result};
use crate::services::AlarmManager;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;

/// Alarm creation form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAlarmRequest {
    /// "HH:MM", 24-hour clock
    pub time: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Alarm as shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmView {
    pub id: i64,
    pub hour: u32,
    pub minute: u32,
    pub time_label: String,
    pub display_time: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl From<&Alarm> for AlarmView {
    fn from(alarm: &Alarm) -> Self {
        Self {
            id: alarm.id,
            hour: alarm.hour,
            minute: alarm.minute,
            time_label: alarm.time_label(),
            display_time: alarm.display_time(),
            name: alarm.name.clone(),
            description: alarm.description.clone(),
            enabled: alarm.is_enabled(),
        }
    }
}

fn lock_alarms(state: &AppState) -> Result<MutexGuard<'_, AlarmManager>> {
    state.alarms.try_lock().map_err(|_| AppError::Busy)
}

fn views(alarms: &[Alarm]) -> Vec<AlarmView> {
    alarms.iter().map(AlarmView::from).collect()
}

/// Parse and check the creation form
fn validate_request(req: &CreateAlarmRequest) -> Result<NaiveTime> {
    let time = req
        .time
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Select a time for the alarm".to_string()))?;

    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:MM", time)))?;

    if req.name.chars().count() > MAX_ALARM_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Alarm name must be at most {} characters",
            MAX_ALARM_NAME_LENGTH
        )));
    }

    if req.description.chars().count() > MAX_ALARM_DESCRIPTION_LENGTH {
        return Err(AppError::Validation(format!(
            "Alarm description must be at most {} characters",
            MAX_ALARM_DESCRIPTION_LENGTH
        )));
    }

    Ok(time)
}

/// Reload the alarm list from storage
pub async fn load_alarms(state: &AppState) -> Result<Vec<AlarmView>> {
    let mut manager = lock_alarms(state)?;
    let alarms = manager.load().await?;
    Ok(views(alarms))
}

/// Alarms currently held by the session
pub fn list_alarms(state: &AppState) -> Result<Vec<AlarmView>> {
    let manager = lock_alarms(state)?;
    Ok(views(manager.alarms()))
}

/// Create a new enabled alarm
pub async fn create_alarm(state: &AppState, req: CreateAlarmRequest) -> Result<AlarmView> {
    let time = validate_request(&req)?;
    let mut manager = lock_alarms(state)?;

    let alarm = manager
        .create(time.hour(), time.minute(), &req.name, &req.description)
        .await?;

    Ok(AlarmView::from(&alarm))
}

/// Enable or disable an alarm; `None` when the id is unknown
pub async fn toggle_alarm(state: &AppState, id: i64) -> Result<Option<AlarmView>> {
    let mut manager = lock_alarms(state)?;
    let alarm = manager.toggle_enabled(id).await?;
    Ok(alarm.as_ref().map(AlarmView::from))
}

/// Delete an alarm; `false` when the id is unknown
pub async fn delete_alarm(state: &AppState, id: i64) -> Result<bool> {
    let mut manager = lock_alarms(state)?;
    manager.remove(id).await
}

/// Total and enabled alarm counts
pub fn get_alarm_counts(state: &AppState) -> Result<AlarmCounts> {
    let manager = lock_alarms(state)?;
    Ok(manager.counts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::request_notification_permission;
    use crate::services::{AppSettings, CronNotificationScheduler, RecordingNotifier};
    use crate::storage::{AlarmStore, MemoryStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_state(allow_notifications: bool) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let scheduler = CronNotificationScheduler::new(
            Arc::new(RecordingNotifier::new()),
            allow_notifications,
        )
        .await
        .unwrap();
        let store = AlarmStore::new(Arc::new(MemoryStore::new()), "@alarms");

        let state = AppState::new(
            temp_dir.path().to_path_buf(),
            AppSettings::default(),
            store,
            Arc::new(scheduler),
        );
        (state, temp_dir)
    }

    fn request(time: Option<&str>, name: &str) -> CreateAlarmRequest {
        CreateAlarmRequest {
            time: time.map(str::to_string),
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_requires_time() {
        let (state, _temp) = create_test_state(true).await;
        request_notification_permission(&state).await.unwrap();

        let err = create_alarm(&state, request(None, "Despertar")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_alarm(&state, request(Some("7h30"), "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(list_alarms(&state).unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_rejects_long_name() {
        let (state, _temp) = create_test_state(true).await;
        request_notification_permission(&state).await.unwrap();

        let name = "a".repeat(MAX_ALARM_NAME_LENGTH + 1);
        let err = create_alarm(&state, request(Some("07:30"), &name)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let name = "ñ".repeat(MAX_ALARM_NAME_LENGTH);
        create_alarm(&state, request(Some("07:30"), &name)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_without_permission() {
        let (state, _temp) = create_test_state(false).await;
        request_notification_permission(&state).await.unwrap();

        let err = create_alarm(&state, request(Some("07:30"), "")).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
        assert_eq!(get_alarm_counts(&state).unwrap().total, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_toggle_delete_flow() {
        let (state, _temp) = create_test_state(true).await;
        request_notification_permission(&state).await.unwrap();

        let view = create_alarm(&state, request(Some("19:05"), "Cena")).await.unwrap();
        assert_eq!(view.time_label, "19:05");
        assert_eq!(view.display_time, "07:05 PM");
        assert!(view.enabled);

        let toggled = toggle_alarm(&state, view.id).await.unwrap().unwrap();
        assert!(!toggled.enabled);
        assert_eq!(
            get_alarm_counts(&state).unwrap(),
            AlarmCounts { total: 1, enabled: 0 }
        );

        assert!(toggle_alarm(&state, view.id + 1).await.unwrap().is_none());

        assert!(delete_alarm(&state, view.id).await.unwrap());
        assert!(!delete_alarm(&state, view.id).await.unwrap());
        assert!(load_alarms(&state).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_busy_while_operation_in_flight() {
        let (state, _temp) = create_test_state(true).await;
        request_notification_permission(&state).await.unwrap();

        let _in_flight = state.alarms.lock().await;

        let err = create_alarm(&state, request(Some("07:30"), "")).await.unwrap_err();
        assert!(matches!(err, AppError::Busy));
        assert!(matches!(get_alarm_counts(&state), Err(AppError::Busy)));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let alarm: Alarm =
            serde_json::from_str(r#"{"id":1,"hour":6,"minute":0,"enabled":false}"#).unwrap();
        let json = serde_json::to_value(AlarmView::from(&alarm)).unwrap();

        assert_eq!(json["timeLabel"], "06:00");
        assert_eq!(json["displayTime"], "06:00 AM");
        assert_eq!(json["enabled"], false);
    }
}
