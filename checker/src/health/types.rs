//! Node types, check targets and verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{session::SSH_PORT, verdict::MAX_ERROR_LEN};
use crate::database::NodeRecord;
use crate::errors::CheckError;
use crate::ssh::SessionTarget;

/// Outcome of one check; fields are read through accessors only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthVerdict {
    ok: bool,
    message: String,
    reward: f64,
}

impl HealthVerdict {
    pub fn ok(message: impl Into<String>, reward: f64) -> Self {
        Self {
            ok: true,
            message: message.into(),
            reward,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            reward: 0.0,
        }
    }

    /// Rebuild a verdict read back from storage
    pub fn restore(ok: bool, message: String, reward: f64) -> Self {
        Self { ok, message, reward }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ok, self.message)
    }
}

/// Cut a diagnostic to `MAX_ERROR_LEN` characters
pub fn truncate_diagnostic(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_LEN) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Aptos,
    Minima,
    Cosmos,
    Massa,
    Starknet,
    Defund,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Aptos,
        NodeType::Minima,
        NodeType::Cosmos,
        NodeType::Massa,
        NodeType::Starknet,
        NodeType::Defund,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Aptos => "aptos",
            NodeType::Minima => "minima",
            NodeType::Cosmos => "cosmos",
            NodeType::Massa => "massa",
            NodeType::Starknet => "starknet",
            NodeType::Defund => "defund",
        }
    }

    /// Comma separated list of every tag, for error replies
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|node_type| node_type.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CheckError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|node_type| node_type.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| CheckError::UnsupportedNodeType(tag.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Api,
    Session,
}

/// Connection details resolved for one check
#[derive(Debug, Clone)]
pub enum Endpoint {
    Api {
        host: String,
        port: u16,
    },
    Session {
        target: SessionTarget,
        terminal: Option<String>,
        use_sudo: bool,
    },
}

/// A stored node with its type resolved and transport fields verified
#[derive(Debug, Clone)]
pub struct NodeTarget {
    pub node_id: i64,
    pub node_type: NodeType,
    pub endpoint: Endpoint,
}

impl NodeTarget {
    pub fn from_record(record: &NodeRecord) -> Result<Self, CheckError> {
        let node_type: NodeType = record.node_type.parse()?;
        let transport = crate::health::registry::spec_for(node_type).transport;

        let endpoint = match transport {
            TransportKind::Api => {
                let port = record.port.ok_or_else(|| {
                    CheckError::InvalidTarget(format!("{} node needs a port", node_type))
                })?;
                if record.ssh_user.is_some() || record.ssh_credential.is_some() {
                    return Err(CheckError::InvalidTarget(format!(
                        "{} node does not use ssh user and credential",
                        node_type
                    )));
                }
                Endpoint::Api {
                    host: record.host.clone(),
                    port,
                }
            }
            TransportKind::Session => {
                let (Some(user), Some(credential)) = (&record.ssh_user, &record.ssh_credential)
                else {
                    return Err(CheckError::InvalidTarget(format!(
                        "{} node needs ssh user and credential",
                        node_type
                    )));
                };
                if record.port.is_some() {
                    return Err(CheckError::InvalidTarget(format!(
                        "{} node does not use a port",
                        node_type
                    )));
                }
                Endpoint::Session {
                    target: SessionTarget {
                        host: record.host.clone(),
                        port: SSH_PORT,
                        user: user.clone(),
                        credential: credential.clone(),
                    },
                    terminal: record.terminal_name.clone(),
                    use_sudo: record.use_sudo,
                }
            }
        };

        Ok(Self {
            node_id: record.id,
            node_type,
            endpoint,
        })
    }
}

/// Short human description: `host:port` for API nodes, `host@user` for session nodes
pub fn describe_node(record: &NodeRecord) -> String {
    match (&record.ssh_user, record.port) {
        (Some(user), _) => format!("{}@{}", record.host, user),
        (None, Some(port)) => format!("{}:{}", record.host, port),
        (None, None) => record.host.clone(),
    }
}

/// Persisted per-node status, mutated only by the health monitor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_verdict: Option<HealthVerdict>,
    /// Status last surfaced to the owner, `None` until one is established
    pub last_notified_ok: Option<bool>,
    pub consecutive_same_count: u32,
}
