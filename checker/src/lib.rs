pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod health;
pub mod http;
pub mod scheduler;
pub mod services;
pub mod ssh;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use database::{Database, NodeStore};
pub use health::{HealthMonitor, HealthVerdict, NodeType};
pub use services::{NodeService, Notifier, WebhookNotifier};
pub use ssh::SshConnector;
