//! Cron-based scheduling of node checks
//!
//! Jobs use 6-field cron expressions (sec min hour day month dow):
//! - the periodic check of every owner's nodes, with change notifications
//! - the daily cached status report, evaluated in the configured time zone
//! - the project catalogue diff, when a tracker is attached
//!
//! ```toml
//! check_schedule = "0 */5 * * * *"
//! daily_report_schedule = "0 0 9 * * *"  # empty string disables the report
//!
//! [project_tracker]
//! schedule = "0 */15 * * * *"
//! ```

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::health::HealthMonitor;
use crate::services::ProjectTracker;

pub struct CheckScheduler {
    monitor: Arc<HealthMonitor>,
    config: Arc<Config>,
    tracker: Option<Arc<ProjectTracker>>,
    scheduler: JobScheduler,
}

impl CheckScheduler {
    pub async fn new(monitor: Arc<HealthMonitor>, config: Arc<Config>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            monitor,
            config,
            tracker: None,
            scheduler,
        })
    }

    pub fn with_project_tracker(mut self, tracker: Arc<ProjectTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.schedule_periodic_check(&self.config.check_schedule)
            .await?;
        info!("Scheduled node checks: {}", self.config.check_schedule);

        match self.config.daily_report_schedule() {
            Some(schedule) => {
                let timezone: Tz = self
                    .config
                    .timezone
                    .parse()
                    .map_err(|e| anyhow!("Invalid timezone '{}': {}", self.config.timezone, e))?;
                self.schedule_daily_report(schedule, timezone).await?;
                info!("Scheduled daily report: {} ({})", schedule, timezone);
            }
            None => info!("Daily report disabled"),
        }

        if let Some(tracker) = &self.tracker {
            let schedule = &self.config.project_tracker.schedule;
            self.schedule_project_tracking(schedule, tracker.clone())
                .await?;
            info!("Scheduled project tracking: {}", schedule);
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;
        info!("Check scheduler started");
        Ok(())
    }

    async fn schedule_periodic_check(&self, schedule: &str) -> Result<()> {
        let monitor = self.monitor.clone();

        let job = Job::new_async(schedule, move |_uuid, _scheduler| {
            let monitor = monitor.clone();
            Box::pin(async move {
                run_periodic_check(monitor).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create check job for '{}': {}", schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add check job to scheduler: {}", e))?;
        Ok(())
    }

    async fn schedule_daily_report(&self, schedule: &str, timezone: Tz) -> Result<()> {
        let monitor = self.monitor.clone();

        let job = Job::new_async_tz(schedule, timezone, move |_uuid, _scheduler| {
            let monitor = monitor.clone();
            Box::pin(async move {
                run_daily_report(monitor).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create report job for '{}': {}", schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add report job to scheduler: {}", e))?;
        Ok(())
    }

    async fn schedule_project_tracking(&self, schedule: &str, tracker: Arc<ProjectTracker>) -> Result<()> {
        let job = Job::new_async(schedule, move |_uuid, _scheduler| {
            let tracker = tracker.clone();
            Box::pin(async move {
                run_project_tracking(tracker).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create tracking job for '{}': {}", schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add tracking job to scheduler: {}", e))?;
        Ok(())
    }
}

#[instrument(skip(monitor))]
async fn run_periodic_check(monitor: Arc<HealthMonitor>) {
    info!("Executing scheduled node check");
    if let Err(e) = monitor.check_all_owners(true).await {
        error!("Scheduled node check failed: {}", e);
    }
}

#[instrument(skip(monitor))]
async fn run_daily_report(monitor: Arc<HealthMonitor>) {
    info!("Executing daily status report");
    if let Err(e) = monitor.send_daily_reports().await {
        error!("Daily status report failed: {}", e);
    }
}

#[instrument(skip(tracker))]
async fn run_project_tracking(tracker: Arc<ProjectTracker>) {
    info!("Executing project catalogue check");
    if let Err(e) = tracker.run().await {
        error!("Project catalogue check failed: {}", e);
    }
}
