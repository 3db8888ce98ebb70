//! Services module
//!
//! Business logic services that coordinate between commands, the
//! notification scheduler, and storage.

pub mod alarms;
pub mod notifier;
pub mod scheduler;
pub mod settings;

pub use alarms::{AlarmManager, ReconcileReport};
pub use notifier::{Notifier, RecordingNotifier, TracingNotifier};
pub use scheduler::{CronNotificationScheduler, NotificationScheduler};
pub use settings::{
    AppSettings, NotificationSettings, RuntimeSettings, SettingsService, StorageBackend,
    StorageSettings,
};
