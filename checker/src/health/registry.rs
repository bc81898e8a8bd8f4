//! Static table of supported node types
//!
//! Every lookup happens before any network or session I/O, so an unknown tag
//! is rejected without touching the node.

use std::time::Duration;

use super::types::{NodeType, TransportKind};
use crate::errors::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Aptos,
    Minima,
    CosmosStatus,
    Massa,
    Starknet,
}

/// Advisory reference source compared against the node's own reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossCheck {
    /// `ledger_version` of the configured aptos reference ledger
    AptosLedger,
}

#[derive(Debug)]
pub struct CheckerSpec {
    pub node_type: NodeType,
    pub transport: TransportKind,
    pub parser: ParserKind,
    /// Path appended to `http://{host}:{port}` for API nodes
    pub api_path: Option<&'static str>,
    /// Commands typed into the session, in order
    pub commands: &'static [&'static str],
    pub cross_check: Option<CrossCheck>,
    /// Replaces the configured after-command wait for this type
    pub after_command_wait: Option<Duration>,
}

impl CheckerSpec {
    pub fn api_url(&self, host: &str, port: u16) -> Option<String> {
        self.api_path
            .map(|path| format!("http://{}:{}{}", host, port, path))
    }
}

static REGISTRY: [CheckerSpec; 6] = [
    CheckerSpec {
        node_type: NodeType::Aptos,
        transport: TransportKind::Api,
        parser: ParserKind::Aptos,
        api_path: Some("/metrics"),
        commands: &[],
        cross_check: Some(CrossCheck::AptosLedger),
        after_command_wait: None,
    },
    CheckerSpec {
        node_type: NodeType::Minima,
        transport: TransportKind::Api,
        parser: ParserKind::Minima,
        api_path: Some("/incentivecash"),
        commands: &[],
        cross_check: None,
        after_command_wait: None,
    },
    CheckerSpec {
        node_type: NodeType::Cosmos,
        transport: TransportKind::Api,
        parser: ParserKind::CosmosStatus,
        api_path: Some("/status"),
        commands: &[],
        cross_check: None,
        after_command_wait: None,
    },
    CheckerSpec {
        node_type: NodeType::Massa,
        transport: TransportKind::Session,
        parser: ParserKind::Massa,
        api_path: None,
        commands: &["wallet_info"],
        cross_check: None,
        // wallet_info prints slowly
        after_command_wait: Some(Duration::from_secs(3)),
    },
    CheckerSpec {
        node_type: NodeType::Starknet,
        transport: TransportKind::Session,
        parser: ParserKind::Starknet,
        api_path: None,
        commands: &["systemctl status starknetd | grep Active"],
        cross_check: None,
        after_command_wait: None,
    },
    CheckerSpec {
        node_type: NodeType::Defund,
        transport: TransportKind::Session,
        parser: ParserKind::CosmosStatus,
        api_path: None,
        commands: &["curl localhost:26657/status"],
        cross_check: None,
        after_command_wait: None,
    },
];

pub fn spec_for(node_type: NodeType) -> &'static CheckerSpec {
    let index = match node_type {
        NodeType::Aptos => 0,
        NodeType::Minima => 1,
        NodeType::Cosmos => 2,
        NodeType::Massa => 3,
        NodeType::Starknet => 4,
        NodeType::Defund => 5,
    };
    &REGISTRY[index]
}

/// Resolve a stored or user supplied tag
pub fn resolve(tag: &str) -> Result<&'static CheckerSpec, CheckError> {
    let node_type: NodeType = tag.parse()?;
    Ok(spec_for(node_type))
}
