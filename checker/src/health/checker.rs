//! Per-node check: registry lookup, transport, parser
//!
//! This is the containment boundary. Whatever goes wrong while checking one
//! node comes out as a failed [`HealthVerdict`], never as an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::parsers::{self, NodeReply, ParseContext};
use super::registry::{spec_for, CheckerSpec, CrossCheck};
use super::types::{truncate_diagnostic, Endpoint, HealthVerdict, NodeTarget, TransportKind};
use crate::config::Config;
use crate::database::NodeRecord;
use crate::errors::{CheckError, ParseError};
use crate::http::ApiProbe;
use crate::ssh::{run_session, SessionSettings, SessionTarget, ShellConnector};

/// Check-time settings derived from [`Config`]
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub request_timeout: Duration,
    pub session: SessionSettings,
    /// Per node type after-command wait, keyed by type tag
    pub after_command_overrides: HashMap<String, Duration>,
    pub aptos_ledger_url: Option<String>,
}

impl CheckSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            session: SessionSettings::from_config(&config.session),
            after_command_overrides: config
                .session
                .after_command_overrides
                .iter()
                .map(|(tag, seconds)| (tag.to_lowercase(), Duration::from_secs(*seconds)))
                .collect(),
            aptos_ledger_url: config
                .cross_check
                .aptos_ledger_url
                .clone()
                .filter(|url| !url.is_empty()),
        }
    }

    fn session_for(&self, spec: &CheckerSpec) -> SessionSettings {
        let wait = self
            .after_command_overrides
            .get(spec.node_type.as_str())
            .copied()
            .or(spec.after_command_wait);

        match wait {
            Some(wait) => self.session.clone().with_after_command_wait(wait),
            None => self.session.clone(),
        }
    }
}

pub struct NodeChecker {
    probe: ApiProbe,
    connector: Arc<dyn ShellConnector>,
    settings: CheckSettings,
}

impl NodeChecker {
    pub fn new(probe: ApiProbe, connector: Arc<dyn ShellConnector>, settings: CheckSettings) -> Self {
        Self {
            probe,
            connector,
            settings,
        }
    }

    pub async fn check(&self, record: &NodeRecord) -> HealthVerdict {
        let target = match NodeTarget::from_record(record) {
            Ok(target) => target,
            Err(e) => {
                warn!("Node {} cannot be checked: {}", record.id, e);
                return HealthVerdict::failed(truncate_diagnostic(&e.to_string()));
            }
        };
        let spec = spec_for(target.node_type);

        let verdict = match &target.endpoint {
            Endpoint::Api { host, port } => self.check_api(spec, host, *port).await,
            Endpoint::Session {
                target: session,
                terminal,
                use_sudo,
            } => {
                self.check_session(spec, session, terminal.as_deref(), *use_sudo)
                    .await
            }
        };

        debug!(
            "Node {} ({}) checked: {}",
            record.id, target.node_type, verdict
        );
        verdict
    }

    async fn check_api(&self, spec: &CheckerSpec, host: &str, port: u16) -> HealthVerdict {
        let Some(url) = spec.api_url(host, port) else {
            return HealthVerdict::failed(format!("{} has no API endpoint", spec.node_type));
        };

        let reply = match self.probe.get(&url, self.settings.request_timeout).await {
            Ok(reply) => reply,
            Err(e) => return failed_with(TransportKind::Api, &e),
        };
        if !reply.is_usable() {
            return HealthVerdict::failed(format!("Wrong request answer code {}", reply.status));
        }

        let context = self.cross_check(spec).await;
        verdict_of(
            TransportKind::Api,
            parsers::parse(spec.parser, &NodeReply::Body(reply.body), &context),
        )
    }

    async fn check_session(
        &self,
        spec: &CheckerSpec,
        target: &SessionTarget,
        terminal: Option<&str>,
        use_sudo: bool,
    ) -> HealthVerdict {
        let lines = match run_session(
            self.connector.as_ref(),
            target,
            self.settings.session_for(spec),
            spec.commands,
            terminal,
            use_sudo,
        )
        .await
        {
            Ok(lines) => lines,
            Err(e) => return failed_with(TransportKind::Session, &e),
        };

        let context = self.cross_check(spec).await;
        verdict_of(
            TransportKind::Session,
            parsers::parse(spec.parser, &NodeReply::Lines(lines), &context),
        )
    }

    async fn cross_check(&self, spec: &CheckerSpec) -> ParseContext {
        let reference_height = match (spec.cross_check, &self.settings.aptos_ledger_url) {
            (Some(CrossCheck::AptosLedger), Some(url)) => {
                self.probe.reference_height(url, "ledger_version").await
            }
            _ => None,
        };

        ParseContext { reference_height }
    }
}

fn verdict_of(transport: TransportKind, parsed: Result<HealthVerdict, ParseError>) -> HealthVerdict {
    parsed
        .map_err(CheckError::from)
        .unwrap_or_else(|e| failed_with(transport, &e))
}

/// `Wrong request answer ...` or `Wrong ssh answer ...`, diagnostic truncated
fn failed_with(transport: TransportKind, error: &CheckError) -> HealthVerdict {
    let prefix = match transport {
        TransportKind::Api => "Wrong request answer",
        TransportKind::Session => "Wrong ssh answer",
    };
    HealthVerdict::failed(format!(
        "{} {}",
        prefix,
        truncate_diagnostic(&failure_reason(error))
    ))
}

// Transport errors carry the peer address; the verdict line already names it
fn failure_reason(error: &CheckError) -> String {
    match error {
        CheckError::Connection { reason, .. } | CheckError::Request { reason, .. } => {
            reason.clone()
        }
        other => other.to_string(),
    }
}
