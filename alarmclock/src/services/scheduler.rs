/// Notification Scheduler
/// Registers one daily-repeating cron job per enabled alarm and hands
/// fired alarms to a Notifier. Jobs run on local device time.
use crate::database::{NotificationContent, PermissionStatus, SchedulerRef, Trigger};
use crate::error::{AppError, Result};
use crate::services::Notifier;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Service that fires notifications on a daily trigger
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionStatus>;

    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Register a repeating trigger and return its identifier
    async fn schedule(&self, content: NotificationContent, trigger: Trigger)
        -> Result<SchedulerRef>;

    /// Unregister a trigger. Unknown identifiers are not an error.
    async fn cancel(&self, scheduler_ref: &SchedulerRef) -> Result<()>;

    async fn is_scheduled(&self, scheduler_ref: &SchedulerRef) -> Result<bool>;
}

/// In-process scheduler backed by tokio-cron-scheduler
pub struct CronNotificationScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    notifier: Arc<dyn Notifier>,
    registrations: Arc<RwLock<HashMap<Uuid, Trigger>>>,
    permission: RwLock<PermissionStatus>,
    allow_notifications: bool,
}

impl CronNotificationScheduler {
    /// Create new scheduler; permission starts undetermined
    pub async fn new(notifier: Arc<dyn Notifier>, allow_notifications: bool) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            notifier,
            registrations: Arc::new(RwLock::new(HashMap::new())),
            permission: RwLock::new(PermissionStatus::Undetermined),
            allow_notifications,
        })
    }

    /// Start firing registered jobs
    pub async fn start(&self) -> Result<()> {
        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        tracing::info!("Notification scheduler started");
        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Notification scheduler shutdown");
        Ok(())
    }

    /// Number of live registrations
    pub async fn registration_count(&self) -> usize {
        self.registrations.read().await.len()
    }

    fn parse_ref(scheduler_ref: &SchedulerRef) -> Option<Uuid> {
        Uuid::parse_str(scheduler_ref.as_str()).ok()
    }
}

fn validate_trigger(trigger: &Trigger) -> Result<()> {
    if trigger.hour > 23 || trigger.minute > 59 {
        return Err(AppError::Scheduler(format!(
            "Invalid trigger time {:02}:{:02}",
            trigger.hour, trigger.minute
        )));
    }
    if !trigger.repeats {
        return Err(AppError::Scheduler(
            "Only repeating daily triggers are supported".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl NotificationScheduler for CronNotificationScheduler {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        Ok(*self.permission.read().await)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let status = if self.allow_notifications {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };

        *self.permission.write().await = status;
        tracing::info!("Notification permission resolved to {:?}", status);
        Ok(status)
    }

    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
    ) -> Result<SchedulerRef> {
        if !self.permission.read().await.is_granted() {
            return Err(AppError::PermissionDenied);
        }
        validate_trigger(&trigger)?;

        let cron_expr = trigger.to_cron();
        let notifier = Arc::clone(&self.notifier);

        let job = Job::new_async_tz(cron_expr.as_str(), chrono::Local, move |_uuid, _l| {
            let notifier = Arc::clone(&notifier);
            let content = content.clone();
            Box::pin(async move {
                if let Err(e) = notifier.deliver(&content) {
                    tracing::error!("Failed to deliver alarm notification: {}", e);
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create alarm job: {}", e)))?;

        let job_id = job.guid();

        // Recorded before the job exists so an interrupted call can still be cancelled
        self.registrations.write().await.insert(job_id, trigger);

        let added = self.scheduler.write().await.add(job).await;
        if let Err(e) = added {
            self.registrations.write().await.remove(&job_id);
            return Err(AppError::Scheduler(format!("Failed to schedule job: {}", e)));
        }

        tracing::info!("Alarm job {} scheduled ({})", job_id, cron_expr);
        Ok(SchedulerRef::new(job_id.to_string()))
    }

    async fn cancel(&self, scheduler_ref: &SchedulerRef) -> Result<()> {
        let Some(job_id) = Self::parse_ref(scheduler_ref) else {
            tracing::debug!("Ignoring cancel for foreign id {}", scheduler_ref);
            return Ok(());
        };

        if !self.registrations.read().await.contains_key(&job_id) {
            tracing::debug!("Alarm job {} already cancelled", job_id);
            return Ok(());
        }

        // The registration outlives a failed removal so the job stays cancellable
        self.scheduler
            .write()
            .await
            .remove(&job_id)
            .await
            .map_err(|e| AppError::Cancellation(format!("Failed to remove job: {}", e)))?;
        self.registrations.write().await.remove(&job_id);

        tracing::info!("Alarm job {} cancelled", job_id);
        Ok(())
    }

    async fn is_scheduled(&self, scheduler_ref: &SchedulerRef) -> Result<bool> {
        Ok(match Self::parse_ref(scheduler_ref) {
            Some(job_id) => self.registrations.read().await.contains_key(&job_id),
            None => false,
        })
    }
}
