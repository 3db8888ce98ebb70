//! Commands exposed to the presentation layer
//!
//! Every command takes the shared [`AppState`] and returns a `Result`
//! whose error serializes to a user-facing message.
//! - `alarms`: alarm list, creation form, toggling and deletion
//! - `permissions`: notification permission prompt
//! - `settings`: notification, storage and runtime settings

pub mod alarms;
pub mod permissions;
pub mod settings;

use crate::app::AppState;
use crate::error::Result;

pub use alarms::*;
pub use permissions::*;
pub use settings::*;

/// Application information structure
#[derive(Debug, serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
    pub storage_backend: crate::services::StorageBackend,
}

/// Get application information
pub fn get_app_info(state: &AppState) -> Result<AppInfo> {
    Ok(AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.app_data_dir.to_string_lossy().to_string(),
        storage_backend: state.settings.storage.backend,
    })
}
