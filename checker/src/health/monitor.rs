use anyhow::{anyhow, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::checker::{CheckSettings, NodeChecker};
use super::hysteresis;
use super::types::describe_node;
use crate::config::{Config, HysteresisConfig};
use crate::constants::text::{CHANGED_HEADER, METRICS_PREFIX, NO_NODES};
use crate::database::{CheckRecord, NodeStore};
use crate::http::ApiProbe;
use crate::services::Notifier;
use crate::ssh::ShellConnector;

/// Runs checks for an owner's nodes and keeps their status current
pub struct HealthMonitor {
    store: Arc<dyn NodeStore>,
    notifier: Arc<dyn Notifier>,
    checker: NodeChecker,
    hysteresis: HysteresisConfig,
    timezone: Tz,
    // One lock per owner so scheduled and manual runs never interleave
    owner_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<dyn NodeStore>,
        notifier: Arc<dyn Notifier>,
        checker: NodeChecker,
        hysteresis: HysteresisConfig,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            notifier,
            checker,
            hysteresis,
            timezone,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn NodeStore>,
        notifier: Arc<dyn Notifier>,
        connector: Arc<dyn ShellConnector>,
    ) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow!("Invalid timezone '{}': {}", config.timezone, e))?;
        let checker = NodeChecker::new(
            ApiProbe::new(),
            connector,
            CheckSettings::from_config(config),
        );

        Ok(Self::new(store, notifier, checker, config.hysteresis, timezone))
    }

    async fn owner_lock(&self, owner_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.owner_locks.lock().await;
        locks.entry(owner_id).or_default().clone()
    }

    /// Check every node of `owner` now and return the numbered status report
    ///
    /// Confirmed status changes are pushed through the notifier when
    /// `send_changes` is set. Node failures are part of the report; only
    /// storage failures abort the run.
    pub async fn check_nodes_now(&self, owner_id: i64, send_changes: bool) -> Result<String> {
        let lock = self.owner_lock(owner_id).await;
        let _guard = lock.lock().await;

        let run_id = Uuid::new_v4();
        let nodes = self.store.list_nodes(owner_id).await?;
        if nodes.is_empty() {
            return Ok(NO_NODES.to_string());
        }
        info!("[{}] Checking {} nodes of owner {}", run_id, nodes.len(), owner_id);

        let mut report = Vec::with_capacity(nodes.len());
        let mut changed = Vec::new();
        let mut rewards: BTreeMap<String, f64> = BTreeMap::new();

        for (index, node) in nodes.iter().enumerate() {
            let verdict = self.checker.check(node).await;
            let checked_at = Utc::now();

            let line = format!(
                "{}. {} {} {}",
                index + 1,
                node.node_type,
                describe_node(node),
                verdict
            );

            let transition = hysteresis::apply(&node.state, &verdict, &self.hysteresis, checked_at);
            if transition.notify {
                info!("[{}] Status change confirmed: {}", run_id, line);
                changed.push(line.clone());
            }

            self.store
                .append_history(&CheckRecord {
                    node_id: node.id,
                    checked_at,
                    verdict: verdict.clone(),
                })
                .await?;
            self.store.save_state(node.id, &transition.state).await?;

            *rewards.entry(node.node_type.clone()).or_insert(0.0) += verdict.reward();
            report.push(line);
        }

        if send_changes && !changed.is_empty() {
            let text = format!("{}\n{}", CHANGED_HEADER, changed.join("\n"));
            if let Err(e) = self.notifier.send(owner_id, &text).await {
                warn!("[{}] Failed to notify owner {}: {}", run_id, owner_id, e);
            }
        }

        debug!("[{}] Run for owner {} finished", run_id, owner_id);
        Ok(format!("{}\n\n{}", report.join("\n"), metrics_line(&rewards)))
    }

    /// Render the last stored status of every node without contacting any of them
    pub async fn check_nodes_cached(&self, owner_id: i64) -> Result<String> {
        let nodes = self.store.list_nodes(owner_id).await?;
        if nodes.is_empty() {
            return Ok(NO_NODES.to_string());
        }

        let mut report = Vec::new();
        let mut current_header: Option<String> = None;
        let mut rewards: BTreeMap<String, f64> = BTreeMap::new();

        for (index, node) in nodes.iter().enumerate() {
            if let Some(checked_at) = node.state.last_checked_at {
                let minute = checked_at
                    .with_timezone(&self.timezone)
                    .format("%Y-%m-%d %H:%M")
                    .to_string();
                if current_header.as_deref() != Some(minute.as_str()) {
                    report.push(format!("Checked at {}:", minute));
                    current_header = Some(minute);
                }
            }

            let status = match &node.state.last_verdict {
                Some(verdict) => verdict.to_string(),
                None => "(not checked yet)".to_string(),
            };
            report.push(format!(
                "{}. {} {} {}",
                index + 1,
                node.node_type,
                describe_node(node),
                status
            ));

            let reward = node
                .state
                .last_verdict
                .as_ref()
                .map_or(0.0, |verdict| verdict.reward());
            *rewards.entry(node.node_type.clone()).or_insert(0.0) += reward;
        }

        Ok(format!("{}\n\n{}", report.join("\n"), metrics_line(&rewards)))
    }

    /// Periodic sweep over every owner, one owner at a time
    pub async fn check_all_owners(&self, send_changes: bool) -> Result<()> {
        let owners = self.store.list_owners().await?;
        info!("Checking nodes of {} owners", owners.len());

        for owner_id in owners {
            if let Err(e) = self.check_nodes_now(owner_id, send_changes).await {
                error!("Check run for owner {} failed: {}", owner_id, e);
            }
        }
        Ok(())
    }

    /// Send every owner the cached status report
    pub async fn send_daily_reports(&self) -> Result<()> {
        let owners = self.store.list_owners().await?;

        for owner_id in owners {
            match self.check_nodes_cached(owner_id).await {
                Ok(report) => {
                    if let Err(e) = self.notifier.send(owner_id, &report).await {
                        warn!("Daily report for owner {} not delivered: {}", owner_id, e);
                    }
                }
                Err(e) => error!("Daily report for owner {} failed: {}", owner_id, e),
            }
        }
        Ok(())
    }
}

/// `All metrics: massa=101.5, minima=4`
pub fn metrics_line(rewards: &BTreeMap<String, f64>) -> String {
    let entries = rewards
        .iter()
        .map(|(node_type, reward)| format!("{}={}", node_type, reward))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} {}", METRICS_PREFIX, entries)
}
