//! Alarm lifecycle manager
//!
//! Owns the alarm list for the session and keeps it consistent with the
//! persisted snapshot and the scheduler's live registrations.
//!
//! Every mutating operation talks to the scheduler first and persists the
//! whole list exactly once afterwards. An enabled alarm always holds the
//! ref of its registration; a disabled alarm never holds one.

use crate::config::DEFAULT_OPERATION_TIMEOUT_MS;
use crate::database::{
    Alarm, AlarmCounts, ContentDefaults, NotificationContent, SchedulerRef, Trigger,
};
use crate::error::{AppError, Result};
use crate::services::NotificationScheduler;
use crate::storage::AlarmStore;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Outcome of [`AlarmManager::reconcile`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Enabled alarms that got a fresh registration
    pub rescheduled: usize,
    /// Enabled alarms that could not be registered and were switched off
    pub disabled: usize,
    /// Disabled alarms whose leftover registration was released
    pub released: usize,
    /// Enabled alarms left as stored until notifications are allowed again
    pub deferred: usize,
}

impl ReconcileReport {
    /// True when the list differs from what was loaded
    pub fn changed(&self) -> bool {
        self.rescheduled + self.disabled + self.released > 0
    }
}

pub struct AlarmManager {
    alarms: Vec<Alarm>,
    store: AlarmStore,
    scheduler: Arc<dyn NotificationScheduler>,
    content_defaults: ContentDefaults,
    operation_timeout: Duration,
    last_issued_id: i64,
}

impl AlarmManager {
    pub fn new(store: AlarmStore, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self {
            alarms: Vec::new(),
            store,
            scheduler,
            content_defaults: ContentDefaults::default(),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            last_issued_id: 0,
        }
    }

    pub fn with_content_defaults(mut self, content_defaults: ContentDefaults) -> Self {
        self.content_defaults = content_defaults;
        self
    }

    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn get(&self, id: i64) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    pub fn count(&self) -> usize {
        self.alarms.len()
    }

    pub fn enabled_count(&self) -> usize {
        self.alarms.iter().filter(|a| a.is_enabled()).count()
    }

    pub fn counts(&self) -> AlarmCounts {
        AlarmCounts {
            total: self.count(),
            enabled: self.enabled_count(),
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Records are taken as stored; see [`AlarmManager::reconcile`].
    pub async fn load(&mut self) -> Result<&[Alarm]> {
        let alarms = self.call_store("load", self.store.load()).await?;

        if let Some(max_id) = alarms.iter().map(|a| a.id).max() {
            self.last_issued_id = self.last_issued_id.max(max_id);
        }
        self.alarms = alarms;

        tracing::info!(
            "Loaded {} alarms ({} enabled)",
            self.count(),
            self.enabled_count()
        );
        Ok(&self.alarms)
    }

    /// Create an enabled alarm with a fresh daily registration
    pub async fn create(
        &mut self,
        hour: u32,
        minute: u32,
        name: &str,
        description: &str,
    ) -> Result<Alarm> {
        if hour > 23 || minute > 59 {
            return Err(AppError::InvalidTime { hour, minute });
        }
        let id = self.next_id()?;
        self.ensure_permission().await?;

        let content = NotificationContent::for_alarm(name, description, &self.content_defaults);
        let scheduler_ref = self
            .call_scheduler(
                "schedule",
                self.scheduler.schedule(content, Trigger::daily(hour, minute)),
            )
            .await?;

        self.last_issued_id = id;
        let alarm = Alarm::scheduled(
            id,
            hour,
            minute,
            name.to_string(),
            description.to_string(),
            scheduler_ref,
        );
        self.alarms.push(alarm.clone());

        tracing::info!("Created alarm {} at {}", id, alarm.time_label());

        self.persist().await?;
        Ok(alarm)
    }

    /// Flip an alarm between enabled and disabled.
    ///
    /// Returns `Ok(None)` when no alarm has this id.
    pub async fn toggle_enabled(&mut self, id: i64) -> Result<Option<Alarm>> {
        let Some(index) = self.position(id) else {
            tracing::warn!("Toggle requested for unknown alarm {}", id);
            return Ok(None);
        };

        if self.alarms[index].is_enabled() {
            if let Some(scheduler_ref) = self.alarms[index].scheduler_ref().cloned() {
                self.release(id, &scheduler_ref).await;
            }
            self.alarms[index].deactivate();
            tracing::info!("Disabled alarm {}", id);
        } else {
            let scheduler_ref = self.register(index).await?;
            self.alarms[index].activate(scheduler_ref);
            tracing::info!("Enabled alarm {}", id);
        }

        self.persist().await?;
        Ok(Some(self.alarms[index].clone()))
    }

    /// Delete an alarm, releasing its registration first.
    ///
    /// Returns `Ok(false)` when no alarm has this id.
    pub async fn remove(&mut self, id: i64) -> Result<bool> {
        let Some(index) = self.position(id) else {
            tracing::debug!("Remove requested for unknown alarm {}", id);
            return Ok(false);
        };

        if let Some(scheduler_ref) = self.alarms[index].scheduler_ref().cloned() {
            self.release(id, &scheduler_ref).await;
        }
        self.alarms.remove(index);
        tracing::info!("Removed alarm {}", id);

        self.persist().await?;
        Ok(true)
    }

    /// Re-establish enabled ⇔ registered against the live scheduler.
    ///
    /// Enabled alarms whose registration is gone get a new one, or are
    /// disabled if that fails. While permission is withheld an enabled alarm
    /// keeps its stored state instead. Disabled alarms still holding a ref
    /// have it released. Persists once if anything changed.
    pub async fn reconcile(&mut self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for index in 0..self.alarms.len() {
            let id = self.alarms[index].id;
            let enabled = self.alarms[index].is_enabled();
            let current = self.alarms[index].scheduler_ref().cloned();

            match (enabled, current) {
                (true, Some(scheduler_ref)) => {
                    let live = timeout(
                        self.operation_timeout,
                        self.scheduler.is_scheduled(&scheduler_ref),
                    )
                    .await;
                    match live {
                        Ok(Ok(true)) => continue,
                        Ok(Ok(false)) => self.restore(index, &mut report).await,
                        Ok(Err(e)) => {
                            tracing::warn!("Could not check registration of alarm {}: {}", id, e);
                        }
                        Err(_) => {
                            tracing::warn!("Registration check for alarm {} timed out", id);
                        }
                    }
                }
                (true, None) => self.restore(index, &mut report).await,
                (false, Some(scheduler_ref)) => {
                    self.release(id, &scheduler_ref).await;
                    self.alarms[index].deactivate();
                    report.released += 1;
                }
                (false, None) => {}
            }
        }

        if report.changed() {
            tracing::info!(
                "Reconciled alarms: {} rescheduled, {} disabled, {} released",
                report.rescheduled,
                report.disabled,
                report.released
            );
            self.persist().await?;
        }

        Ok(report)
    }

    async fn restore(&mut self, index: usize, report: &mut ReconcileReport) {
        match self.register(index).await {
            Ok(scheduler_ref) => {
                self.alarms[index].activate(scheduler_ref);
                report.rescheduled += 1;
            }
            Err(AppError::PermissionDenied) if self.alarms[index].scheduler_ref().is_some() => {
                tracing::warn!(
                    "Alarm {} stays enabled until notifications are allowed",
                    self.alarms[index].id
                );
                report.deferred += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Alarm {} lost its registration and was disabled: {}",
                    self.alarms[index].id,
                    e
                );
                self.alarms[index].deactivate();
                report.disabled += 1;
            }
        }
    }

    /// Schedule the alarm at `index` without touching its state
    async fn register(&self, index: usize) -> Result<SchedulerRef> {
        self.ensure_permission().await?;

        let alarm = &self.alarms[index];
        let content =
            NotificationContent::for_alarm(&alarm.name, &alarm.description, &self.content_defaults);
        self.call_scheduler("schedule", self.scheduler.schedule(content, alarm.trigger()))
            .await
    }

    /// Best-effort cancellation; failures are logged and swallowed
    async fn release(&self, id: i64, scheduler_ref: &SchedulerRef) {
        match timeout(self.operation_timeout, self.scheduler.cancel(scheduler_ref)).await {
            Ok(Ok(())) => tracing::debug!("Released registration {} of alarm {}", scheduler_ref, id),
            Ok(Err(e)) => tracing::warn!(
                "Failed to cancel registration {} of alarm {}: {}",
                scheduler_ref,
                id,
                e
            ),
            Err(_) => tracing::warn!(
                "Cancelling registration {} of alarm {} timed out",
                scheduler_ref,
                id
            ),
        }
    }

    async fn ensure_permission(&self) -> Result<()> {
        let status = self
            .call_scheduler("permission check", self.scheduler.permission_status())
            .await?;

        if !status.is_granted() {
            tracing::warn!("Notification permission is {:?}", status);
            return Err(AppError::PermissionDenied);
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        self.call_store("save", self.store.save(&self.alarms))
            .await
            .map_err(|e| {
                tracing::error!(
                    "Alarm list not persisted, registrations may be orphaned: {}",
                    e
                );
                e
            })
    }

    async fn call_scheduler<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e @ (AppError::PermissionDenied | AppError::Scheduler(_)))) => Err(e),
            Ok(Err(e)) => Err(AppError::Scheduler(format!("{} failed: {}", operation, e))),
            Err(_) => Err(AppError::Scheduler(format!(
                "{} timed out after {:?}",
                operation, self.operation_timeout
            ))),
        }
    }

    async fn call_store<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e @ (AppError::Persistence(_) | AppError::Serialization(_)))) => Err(e),
            Ok(Err(e)) => Err(AppError::Persistence(format!("{} failed: {}", operation, e))),
            Err(_) => Err(AppError::Persistence(format!(
                "{} timed out after {:?}",
                operation, self.operation_timeout
            ))),
        }
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.alarms.iter().position(|a| a.id == id)
    }

    /// Millisecond creation timestamp, bumped past every id issued or loaded
    fn next_id(&self) -> Result<i64> {
        let floor = self
            .last_issued_id
            .checked_add(1)
            .ok_or_else(|| AppError::Generic("No alarm ids left".to_string()))?;
        Ok(Utc::now().timestamp_millis().max(floor))
    }
}
