use super::Config;
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: &str) -> Result<Self> {
        let config = Self::load_configuration(config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = Path::new(config_dir).join("main.toml");

        if !main_config_path.exists() {
            warn!(
                "Config file {} not found, running with defaults",
                main_config_path.display()
            );
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&main_config_path)
            .await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path.display(), e))?;

        let config = Self::parse(&content)?;

        info!(
            "Loaded config from {} (check schedule '{}', timezone {})",
            main_config_path.display(),
            config.check_schedule,
            config.timezone
        );

        Ok(config)
    }

    /// Parse and validate a `main.toml` document
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse main config: {}", e))?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<()> {
        config
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone '{}': {}", config.timezone, e))?;

        let hysteresis = &config.hysteresis;
        if hysteresis.confirm_bad_checks == 0 || hysteresis.confirm_good_checks == 0 {
            return Err(anyhow!("Hysteresis thresholds must be at least 1"));
        }

        let session = &config.session;
        if session.poll_interval_seconds == 0 {
            return Err(anyhow!("session.poll_interval_seconds must be at least 1"));
        }
        if session.read_limit_bytes == 0 {
            return Err(anyhow!("session.read_limit_bytes must be positive"));
        }

        validate_6_field_cron(&config.check_schedule)?;
        if let Some(schedule) = config.daily_report_schedule() {
            validate_6_field_cron(schedule)?;
        }
        if config.project_tracker.enabled {
            if config.project_tracker.url.trim().is_empty() {
                return Err(anyhow!("project_tracker.url must not be empty"));
            }
            validate_6_field_cron(&config.project_tracker.schedule)?;
        }

        Ok(())
    }
}

fn validate_6_field_cron(schedule: &str) -> Result<()> {
    let fields = schedule.split_whitespace().count();
    if fields != 6 {
        return Err(anyhow!(
            "Schedule '{}' must have 6 fields (sec min hour day month dow), got {}",
            schedule,
            fields
        ));
    }
    Ok(())
}
