use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use node_checker::config::ConfigManager;
use node_checker::database::Database;
use node_checker::health::HealthMonitor;
use node_checker::scheduler::CheckScheduler;
use node_checker::services::{NodeService, ProjectTracker, WebhookNotifier};
use node_checker::ssh::SshConnector;
use node_checker::web::{start_web_server, AppState};

const CONFIG_DIR_ENV: &str = "NODE_CHECKER_CONFIG_DIR";

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("node_checker=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("russh=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting node checker");

    let config_dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "config".to_string());
    let config_manager = ConfigManager::new(&config_dir).await?;
    let config = config_manager.get_current_config();

    let database = Arc::new(Database::new(&config.database_path).await?);

    if config.notifier_webhook_url.is_empty() {
        warn!("No notifier_webhook_url configured, status changes will only be logged");
    }
    let notifier = Arc::new(WebhookNotifier::new(config.notifier_webhook_url.clone()));

    let health_monitor = Arc::new(HealthMonitor::from_config(
        &config,
        database.clone(),
        notifier.clone(),
        Arc::new(SshConnector::new()),
    )?);
    let node_service = Arc::new(NodeService::new(database.clone()));

    let mut scheduler = CheckScheduler::new(health_monitor.clone(), config.clone()).await?;
    if config.project_tracker.enabled {
        let tracker =
            ProjectTracker::from_config(&config, database.clone(), database.clone(), notifier);
        scheduler = scheduler.with_project_tracker(Arc::new(tracker));
    } else {
        info!("Project tracking disabled");
    }
    scheduler.start().await?;

    let state = AppState::new(config, node_service, health_monitor);
    start_web_server(state).await?;

    Ok(())
}
