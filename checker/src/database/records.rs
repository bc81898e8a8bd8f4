//! Database record types (entities).

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::health::types::{HealthVerdict, NodeState, NodeType};

/// One monitored node as stored, with its current status
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: i64,
    pub owner_id: i64,
    /// Type tag as stored; resolved against the registry at check time
    pub node_type: String,
    pub host: String,
    pub port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_credential: Option<SecretString>,
    pub terminal_name: Option<String>,
    pub use_sudo: bool,
    pub created_at: DateTime<Utc>,
    pub state: NodeState,
}

/// Validated node about to be stored
#[derive(Debug, Clone)]
pub struct NewNode {
    pub owner_id: i64,
    pub node_type: NodeType,
    pub host: String,
    pub port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_credential: Option<SecretString>,
    pub terminal_name: Option<String>,
    pub use_sudo: bool,
}

/// Append-only check history entry
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRecord {
    pub node_id: i64,
    pub checked_at: DateTime<Utc>,
    pub verdict: HealthVerdict,
}

/// Project catalogue as seen by one tracker run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub checked_at: DateTime<Utc>,
    pub projects: Vec<serde_json::Value>,
}
