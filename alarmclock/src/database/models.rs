//! Data models
//!
//! Rust structs representing persisted alarms and the values exchanged
//! with the notification scheduler. All models use serde.

use crate::config::{DEFAULT_ALARM_BODY, DEFAULT_ALARM_TITLE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier returned by the notification scheduler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulerRef(String);

impl SchedulerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchedulerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A daily alarm
///
/// `enabled` and `scheduler_ref` can only change together through
/// [`Alarm::activate`] and [`Alarm::deactivate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: i64,
    pub hour: u32,
    pub minute: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    /// Older records stored the identifier as `notifId`
    #[serde(default, alias = "notifId")]
    scheduler_ref: Option<SchedulerRef>,
}

fn default_enabled() -> bool {
    true
}

impl Alarm {
    /// Build an enabled alarm around a live registration
    pub(crate) fn scheduled(
        id: i64,
        hour: u32,
        minute: u32,
        name: String,
        description: String,
        scheduler_ref: SchedulerRef,
    ) -> Self {
        Self {
            id,
            hour,
            minute,
            name,
            description,
            enabled: true,
            scheduler_ref: Some(scheduler_ref),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scheduler_ref(&self) -> Option<&SchedulerRef> {
        self.scheduler_ref.as_ref()
    }

    /// True when `enabled` agrees with the presence of a scheduler ref
    pub fn is_consistent(&self) -> bool {
        self.enabled == self.scheduler_ref.is_some()
    }

    pub(crate) fn activate(&mut self, scheduler_ref: SchedulerRef) {
        self.scheduler_ref = Some(scheduler_ref);
        self.enabled = true;
    }

    /// Disable the alarm, handing back the registration it held
    pub(crate) fn deactivate(&mut self) -> Option<SchedulerRef> {
        self.enabled = false;
        self.scheduler_ref.take()
    }

    pub fn trigger(&self) -> Trigger {
        Trigger::daily(self.hour, self.minute)
    }

    /// 24-hour label, e.g. "07:30"
    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// 12-hour label, e.g. "07:30 AM"
    pub fn display_time(&self) -> String {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let display_hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{:02}:{:02} {}", display_hour, self.minute, period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerKind {
    Daily,
}

/// Schedule descriptor handed to the notification scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
}

impl Trigger {
    pub fn daily(hour: u32, minute: u32) -> Self {
        Self {
            kind: TriggerKind::Daily,
            hour,
            minute,
            repeats: true,
        }
    }

    /// Six-field cron expression (sec min hour dom mon dow)
    pub fn to_cron(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }
}

/// Fallback texts and sound flag for alarm notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDefaults {
    pub title: String,
    pub body: String,
    pub sound: bool,
}

impl Default for ContentDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_ALARM_TITLE.to_string(),
            body: DEFAULT_ALARM_BODY.to_string(),
            sound: true,
        }
    }
}

/// What the user sees when an alarm fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: bool,
}

impl NotificationContent {
    pub fn for_alarm(name: &str, description: &str, defaults: &ContentDefaults) -> Self {
        let pick = |value: &str, fallback: &str| {
            if value.trim().is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        Self {
            title: pick(name, &defaults.title),
            body: pick(description, &defaults.body),
            sound: defaults.sound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// Totals shown above the alarm list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlarmCounts {
    pub total: usize,
    pub enabled: usize,
}
