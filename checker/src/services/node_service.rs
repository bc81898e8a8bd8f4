//! Node administration: add, delete and list an owner's nodes
//!
//! Requests are validated completely before anything is stored, so a
//! rejected request leaves no trace and never touches the network.

use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::constants::text::CREDENTIAL_MASK;
use crate::database::{NewNode, NodeRecord, NodeStore};
use crate::errors::{CheckError, ValidationError};
use crate::health::registry;
use crate::health::types::{describe_node, NodeType, TransportKind};

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})$").unwrap()
});

const SUDO_ENABLED: [&str; 3] = ["True", "true", "1"];
const TERMINAL_DISABLED: [&str; 5] = ["False", "false", "0", "None", "none"];

/// Loosely typed request value: chat-style clients send everything as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl ParamValue {
    fn as_text(&self) -> String {
        match self {
            ParamValue::Flag(flag) => flag.to_string(),
            ParamValue::Number(number) => number.to_string(),
            ParamValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddNodeRequest {
    pub node_type: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<ParamValue>,
    #[serde(default)]
    pub ssh_user: Option<String>,
    #[serde(default)]
    pub ssh_credential: Option<String>,
    #[serde(default)]
    pub terminal_name: Option<ParamValue>,
    #[serde(default)]
    pub use_sudo: Option<ParamValue>,
}

/// Listing entry; the credential never leaves the service unmasked
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub ordinal: usize,
    pub node_type: String,
    pub host: String,
    pub port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_credential: Option<String>,
    pub terminal_name: Option<String>,
    pub use_sudo: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_ok: Option<bool>,
    pub last_message: Option<String>,
}

impl NodeView {
    pub fn from_record(ordinal: usize, record: &NodeRecord) -> Self {
        let verdict = record.state.last_verdict.as_ref();
        Self {
            ordinal,
            node_type: record.node_type.clone(),
            host: record.host.clone(),
            port: record.port,
            ssh_user: record.ssh_user.clone(),
            ssh_credential: record
                .ssh_credential
                .as_ref()
                .map(|_| CREDENTIAL_MASK.to_string()),
            terminal_name: record.terminal_name.clone(),
            use_sudo: record.use_sudo,
            created_at: record.created_at,
            last_checked_at: record.state.last_checked_at,
            last_ok: verdict.map(|v| v.is_ok()),
            last_message: verdict.map(|v| v.message().to_string()),
        }
    }

    /// One-line description, e.g. `massa 10.0.0.5@root (screen massa, sudo true)`
    pub fn summary(&self) -> String {
        let mut summary = format!("{} {}", self.node_type, self.host);
        if let Some(port) = self.port {
            summary.push_str(&format!(":{}", port));
        }
        if let Some(user) = &self.ssh_user {
            summary.push_str(&format!("@{}", user));
        }
        if self.ssh_user.is_some() {
            summary.push_str(&format!(
                " (screen {}, sudo {})",
                self.terminal_name.as_deref().unwrap_or("none"),
                self.use_sudo
            ));
        }
        summary
    }
}

pub struct NodeService {
    store: Arc<dyn NodeStore>,
}

impl NodeService {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Validate and store a node; validation failures come back as [`ValidationError`]
    pub async fn add_node(&self, owner_id: i64, request: AddNodeRequest) -> Result<NodeView> {
        let node = validate_request(owner_id, request)?;
        let record = self.store.create_node(&node).await?;

        let ordinal = self
            .store
            .list_nodes(owner_id)
            .await?
            .iter()
            .position(|stored| stored.id == record.id)
            .map_or(1, |index| index + 1);

        info!("Owner {} added {}", owner_id, describe_node(&record));
        Ok(NodeView::from_record(ordinal, &record))
    }

    pub async fn delete_node(&self, owner_id: i64, ordinal: usize) -> Result<Option<NodeView>> {
        if ordinal == 0 {
            return Err(ValidationError::InvalidOrdinal(ordinal.to_string()).into());
        }

        let deleted = self.store.delete_node(owner_id, ordinal).await?;
        Ok(deleted.map(|record| NodeView::from_record(ordinal, &record)))
    }

    pub async fn list_nodes(&self, owner_id: i64) -> Result<Vec<NodeView>> {
        let nodes = self.store.list_nodes(owner_id).await?;
        Ok(nodes
            .iter()
            .enumerate()
            .map(|(index, record)| NodeView::from_record(index + 1, record))
            .collect())
    }
}

/// Validation in fixed order: host, node type, port, transport fields
pub fn validate_request(owner_id: i64, request: AddNodeRequest) -> Result<NewNode, ValidationError> {
    let host = request.host.trim().to_string();
    if !is_valid_ipv4(&host) {
        return Err(ValidationError::InvalidHost(host));
    }

    let spec = registry::resolve(&request.node_type).map_err(|e| match e {
        CheckError::UnsupportedNodeType(given) => ValidationError::UnsupportedNodeType {
            given,
            supported: NodeType::supported(),
        },
        other => ValidationError::UnsupportedNodeType {
            given: other.to_string(),
            supported: NodeType::supported(),
        },
    })?;

    let port = request.port.as_ref().map(parse_port).transpose()?;

    let ssh_user = non_blank(request.ssh_user);
    let ssh_credential = non_blank(request.ssh_credential);
    let terminal_name = request
        .terminal_name
        .map(|value| value.as_text().trim().to_string())
        .filter(|name| !name.is_empty() && !TERMINAL_DISABLED.contains(&name.as_str()));
    let use_sudo = request
        .use_sudo
        .map(|value| match value {
            ParamValue::Flag(flag) => flag,
            other => SUDO_ENABLED.contains(&other.as_text().trim()),
        })
        .unwrap_or(false);

    let mismatch = |reason: &str| ValidationError::TransportMismatch {
        node_type: spec.node_type.to_string(),
        reason: reason.to_string(),
    };

    match spec.transport {
        TransportKind::Api => {
            if port.is_none() {
                return Err(mismatch("port is required"));
            }
            if ssh_user.is_some() || ssh_credential.is_some() {
                return Err(mismatch("ssh user and credential are not used"));
            }
        }
        TransportKind::Session => {
            if ssh_user.is_none() || ssh_credential.is_none() {
                return Err(mismatch("ssh user and credential are required"));
            }
            if port.is_some() {
                return Err(mismatch("port is not used"));
            }
        }
    }

    Ok(NewNode {
        owner_id,
        node_type: spec.node_type,
        host,
        port,
        ssh_user,
        ssh_credential: ssh_credential.map(SecretString::from),
        terminal_name,
        use_sudo,
    })
}

pub fn is_valid_ipv4(host: &str) -> bool {
    IPV4.captures(host).is_some_and(|captures| {
        captures
            .iter()
            .skip(1)
            .flatten()
            .all(|octet| octet.as_str().parse::<u16>().is_ok_and(|value| value <= 255))
    })
}

fn parse_port(value: &ParamValue) -> Result<u16, ValidationError> {
    let text = value.as_text();
    let digits = text.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPort(text));
    }
    digits
        .parse::<u16>()
        .map_err(|_| ValidationError::InvalidPort(text.clone()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
