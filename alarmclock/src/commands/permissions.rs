//! Notification permission commands

use crate::app::AppState;
use crate::database::PermissionStatus;
use crate::error::Result;

/// Current notification permission
pub async fn get_notification_permission(state: &AppState) -> Result<PermissionStatus> {
    state.scheduler.permission_status().await
}

/// Ask for notification permission; alarms can only be scheduled once granted
pub async fn request_notification_permission(state: &AppState) -> Result<PermissionStatus> {
    let status = state.scheduler.request_permission().await?;
    if !status.is_granted() {
        tracing::warn!("Notification permission {:?}; alarms cannot be scheduled", status);
    }
    Ok(status)
}
