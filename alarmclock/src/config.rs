//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Alarm Form Limits =====

/// Maximum length of an alarm name in characters
pub const MAX_ALARM_NAME_LENGTH: usize = 30;

/// Maximum length of an alarm description in characters
pub const MAX_ALARM_DESCRIPTION_LENGTH: usize = 100;

// ===== Notification Content =====

/// Title used when an alarm has no name
pub const DEFAULT_ALARM_TITLE: &str = "Alarma";

/// Body used when an alarm has no description
pub const DEFAULT_ALARM_BODY: &str = "¡Es hora!";

// ===== Storage =====

/// Key under which the alarm list is stored
pub const ALARMS_STORAGE_KEY: &str = "@alarms";

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Key-value file used by the JSON storage backend
pub const KEY_VALUE_FILE_NAME: &str = "storage.json";

/// SQLite database file used by the sqlite storage backend
pub const DATABASE_FILE_NAME: &str = "alarms.db";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "ALARMCLOCK_DATA_DIR";

/// Directory name under the user's home when no override is set
pub const DEFAULT_DATA_DIR_NAME: &str = ".alarmclock";

// ===== Operation Timeouts =====

/// Default bound on a single scheduler or store call in milliseconds
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

/// Minimum operation timeout in milliseconds.
/// Lower values make ordinary disk writes fail spuriously.
pub const MIN_OPERATION_TIMEOUT_MS: u64 = 100;

/// Maximum operation timeout in milliseconds (1 minute)
pub const MAX_OPERATION_TIMEOUT_MS: u64 = 60_000;
