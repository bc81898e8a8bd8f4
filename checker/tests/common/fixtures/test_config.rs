//! Test configuration builder for creating test configs programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use node_checker::config::{Config, ConfigManager};

/// Builder producing a `main.toml` in a temporary config directory
///
/// Session timings are zeroed and the aptos reference lookup is disabled
/// unless a ledger URL is given.
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    webhook_url: String,
    timezone: String,
    aptos_ledger_url: String,
    confirm_bad_checks: u32,
    confirm_good_checks: u32,
    catalogue_url: String,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            webhook_url: String::new(),
            timezone: "UTC".to_string(),
            aptos_ledger_url: String::new(),
            confirm_bad_checks: 2,
            confirm_good_checks: 3,
            catalogue_url: "http://127.0.0.1:9/".to_string(),
        }
    }

    pub fn with_webhook(mut self, url: &str) -> Self {
        self.webhook_url = url.to_string();
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }

    pub fn with_aptos_ledger(mut self, url: &str) -> Self {
        self.aptos_ledger_url = url.to_string();
        self
    }

    pub fn with_hysteresis(mut self, bad: u32, good: u32) -> Self {
        self.confirm_bad_checks = bad;
        self.confirm_good_checks = good;
        self
    }

    pub fn with_project_catalogue(mut self, url: &str) -> Self {
        self.catalogue_url = url.to_string();
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let database_path = self.temp_dir.path().join("nodes.db");
        let main_toml = format!(
            r#"database_path = "{}"
timezone = "{}"
notifier_webhook_url = "{}"
request_timeout_seconds = 2

[hysteresis]
confirm_bad_checks = {}
confirm_good_checks = {}

[session]
connect_timeout_seconds = 1
settle_delay_seconds = 0
after_command_wait_seconds = 0
max_command_wait_seconds = 1

[session.after_command_overrides]
massa = 0

[cross_check]
aptos_ledger_url = "{}"

[project_tracker]
url = "{}"
"#,
            database_path.display(),
            self.timezone,
            self.webhook_url,
            self.confirm_bad_checks,
            self.confirm_good_checks,
            self.aptos_ledger_url,
            self.catalogue_url,
        );
        fs::write(config_dir.join("main.toml"), main_toml).expect("Failed to write main.toml");

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestConfig {
    pub async fn load(&self) -> Config {
        let manager = ConfigManager::new(self.config_dir.to_str().expect("utf-8 path"))
            .await
            .expect("Failed to load test config");
        (*manager.get_current_config()).clone()
    }
}
