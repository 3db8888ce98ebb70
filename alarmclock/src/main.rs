// Alarm clock - headless runtime
// Keeps the notification scheduler alive so enabled alarms fire

use alarmclock::{app, commands, services::AlarmManager};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alarmclock=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting alarm clock");

    let data_dir = app::resolve_data_dir();
    let (state, scheduler) = app::setup(data_dir)
        .await
        .context("failed to initialize application")?;

    let permission = commands::request_notification_permission(&state).await?;
    if !permission.is_granted() {
        tracing::warn!("Notifications are not allowed; enabled alarms stay paused until they are");
    }

    restore_alarms(&mut *state.alarms.lock().await).await?;

    scheduler.start().await?;
    tracing::info!("Alarm clock running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}

/// Load persisted alarms and re-register their triggers with the
/// freshly started scheduler
async fn restore_alarms(manager: &mut AlarmManager) -> anyhow::Result<()> {
    manager.load().await.context("failed to load alarms")?;
    let report = manager
        .reconcile()
        .await
        .context("failed to restore alarm registrations")?;

    let counts = manager.counts();
    tracing::info!(
        "{} alarms loaded, {} enabled ({} re-registered, {} switched off, {} paused)",
        counts.total,
        counts.enabled,
        report.rescheduled,
        report.disabled,
        report.deferred
    );
    Ok(())
}
