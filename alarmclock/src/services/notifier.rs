//! Notification delivery
//!
//! Receives the content of an alarm when its trigger fires.

use crate::database::NotificationContent;
use crate::error::Result;
use std::sync::Mutex;

pub trait Notifier: Send + Sync {
    fn deliver(&self, content: &NotificationContent) -> Result<()>;
}

/// Emits fired alarms as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, content: &NotificationContent) -> Result<()> {
        tracing::info!(
            title = %content.title,
            sound = content.sound,
            "Alarm fired: {}",
            content.body
        );
        Ok(())
    }
}

/// Keeps every delivered notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<NotificationContent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<NotificationContent> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, content: &NotificationContent) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(content.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        for title in ["first", "second"] {
            notifier
                .deliver(&NotificationContent {
                    title: title.to_string(),
                    body: String::new(),
                    sound: true,
                })
                .unwrap();
        }

        let titles: Vec<String> = notifier.delivered().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
