pub mod manager;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{defaults, http, projects, session};
pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_check_schedule")]
    pub check_schedule: String,
    #[serde(default = "default_daily_report_schedule")]
    pub daily_report_schedule: Option<String>,
    #[serde(default)]
    pub notifier_webhook_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub hysteresis: HysteresisConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub cross_check: CrossCheckConfig,
    #[serde(default)]
    pub project_tracker: ProjectTrackerConfig,
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

fn default_check_schedule() -> String {
    defaults::CHECK_SCHEDULE.to_string()
}

fn default_daily_report_schedule() -> Option<String> {
    Some(defaults::DAILY_REPORT_SCHEDULE.to_string())
}

fn default_request_timeout() -> u64 {
    http::REQUEST_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            timezone: default_timezone(),
            check_schedule: default_check_schedule(),
            daily_report_schedule: default_daily_report_schedule(),
            notifier_webhook_url: String::new(),
            request_timeout_seconds: default_request_timeout(),
            hysteresis: HysteresisConfig::default(),
            session: SessionConfig::default(),
            cross_check: CrossCheckConfig::default(),
            project_tracker: ProjectTrackerConfig::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Daily report schedule, `None` when disabled with an empty string
    pub fn daily_report_schedule(&self) -> Option<&str> {
        self.daily_report_schedule
            .as_deref()
            .filter(|schedule| !schedule.trim().is_empty())
    }
}

/// How many identical outcomes in a row are needed before a status change is surfaced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HysteresisConfig {
    #[serde(default = "default_confirm_bad")]
    pub confirm_bad_checks: u32,
    #[serde(default = "default_confirm_good")]
    pub confirm_good_checks: u32,
}

fn default_confirm_bad() -> u32 {
    defaults::CONFIRM_BAD_CHECKS
}

fn default_confirm_good() -> u32 {
    defaults::CONFIRM_GOOD_CHECKS
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            confirm_bad_checks: default_confirm_bad(),
            confirm_good_checks: default_confirm_good(),
        }
    }
}

/// Timing policy of the interactive session driver, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_seconds: u64,
    #[serde(default = "default_settle_delay")]
    pub settle_delay_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_max_command_wait")]
    pub max_command_wait_seconds: u64,
    #[serde(default = "default_after_command_wait")]
    pub after_command_wait_seconds: u64,
    #[serde(default = "default_read_limit")]
    pub read_limit_bytes: usize,
    /// Per node type replacement of `after_command_wait_seconds`
    #[serde(default)]
    pub after_command_overrides: HashMap<String, u64>,
}

fn default_connect_timeout() -> u64 {
    session::CONNECT_TIMEOUT.as_secs()
}

fn default_channel_timeout() -> u64 {
    session::CHANNEL_TIMEOUT.as_secs()
}

fn default_settle_delay() -> u64 {
    session::SETTLE_DELAY.as_secs()
}

fn default_poll_interval() -> u64 {
    session::POLL_INTERVAL.as_secs()
}

fn default_max_command_wait() -> u64 {
    session::MAX_COMMAND_WAIT.as_secs()
}

fn default_after_command_wait() -> u64 {
    session::AFTER_COMMAND_WAIT.as_secs()
}

fn default_read_limit() -> usize {
    session::READ_LIMIT_BYTES
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            channel_timeout_seconds: default_channel_timeout(),
            settle_delay_seconds: default_settle_delay(),
            poll_interval_seconds: default_poll_interval(),
            max_command_wait_seconds: default_max_command_wait(),
            after_command_wait_seconds: default_after_command_wait(),
            read_limit_bytes: default_read_limit(),
            after_command_overrides: HashMap::new(),
        }
    }
}

/// Reference data sources for advisory cross-checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckConfig {
    #[serde(default = "default_aptos_ledger_url")]
    pub aptos_ledger_url: Option<String>,
}

fn default_aptos_ledger_url() -> Option<String> {
    Some(defaults::APTOS_LEDGER_URL.to_string())
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            aptos_ledger_url: default_aptos_ledger_url(),
        }
    }
}

/// Periodic diff of the nodes.guru project catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTrackerConfig {
    #[serde(default = "default_tracker_enabled")]
    pub enabled: bool,
    #[serde(default = "default_catalogue_url")]
    pub url: String,
    #[serde(default = "default_track_schedule")]
    pub schedule: String,
}

fn default_tracker_enabled() -> bool {
    true
}

fn default_catalogue_url() -> String {
    projects::CATALOGUE_URL.to_string()
}

fn default_track_schedule() -> String {
    projects::TRACK_SCHEDULE.to_string()
}

impl Default for ProjectTrackerConfig {
    fn default() -> Self {
        Self {
            enabled: default_tracker_enabled(),
            url: default_catalogue_url(),
            schedule: default_track_schedule(),
        }
    }
}
