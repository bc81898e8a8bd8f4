//! This module provides reusable test utilities:
//! - Mock node APIs and a mock webhook (wiremock)
//! - Scripted shell sessions standing in for SSH
//! - A recording notifier
//! - Test configuration builders
//! - Temporary SQLite databases
//! - Common test data

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_node;
pub mod mock_webhook;
pub mod recording_notifier;
pub mod scripted_shell;
pub mod test_config;
pub mod test_data;
pub mod test_database;

// Re-export commonly used items
pub use mock_node::MockNodeServer;
pub use mock_webhook::MockWebhookServer;
pub use recording_notifier::RecordingNotifier;
pub use scripted_shell::ScriptedConnector;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
pub use test_database::TestDatabase;
