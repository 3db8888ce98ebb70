//! Error types for the alarm clock
//!
//! All errors use thiserror for structured error handling.
//! These errors serialize to a plain message for the presentation layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Cancellation error: {0}")]
    Cancellation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid alarm time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Another alarm operation is still in progress")]
    Busy,

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Message shown to the user for a failed operation.
    pub fn user_message(&self) -> String {
        match self {
            AppError::PermissionDenied => {
                "Notifications are disabled. Allow notifications to schedule alarms.".to_string()
            }
            AppError::Scheduler(_) => {
                "The alarm could not be scheduled. Please try again.".to_string()
            }
            AppError::Persistence(_) | AppError::Database(_) | AppError::Io(_) => {
                "The alarm list could not be saved and may not survive a restart.".to_string()
            }
            AppError::Busy => "Please wait for the current operation to finish.".to_string(),
            AppError::InvalidTime { .. } | AppError::Validation(_) => self.to_string(),
            _ => format!("Something went wrong: {}", self),
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.user_message())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_message_is_zero_padded() {
        let err = AppError::InvalidTime { hour: 7, minute: 5 };
        assert_eq!(err.to_string(), "Invalid alarm time 07:05");
    }

    #[test]
    fn test_errors_serialize_to_user_message() {
        let json = serde_json::to_string(&AppError::PermissionDenied).unwrap();
        assert!(json.contains("Allow notifications"));

        let json = serde_json::to_string(&AppError::Scheduler("quota".into())).unwrap();
        assert!(!json.contains("quota"));
    }
}
