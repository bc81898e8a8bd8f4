//! Nodes.guru project catalogue tracking
//!
//! The catalogue page embeds its data as JSON between two script markers.
//! Each run extracts the project list, diffs it against the last stored
//! snapshot and tells every node owner which projects appeared or vanished.
//! The first run only records a baseline.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::projects::{CHANGED_HEADER, DATA_END, DATA_START, PROJECTS_POINTER};
use crate::database::{NodeStore, ProjectSnapshot, ProjectSnapshotStore};
use crate::errors::ParseError;
use crate::http::ApiProbe;
use crate::services::Notifier;

/// Projects listed by the page, all groups concatenated in document order
pub fn extract_projects(html: &str) -> Result<Vec<Value>, ParseError> {
    let start = html
        .find(DATA_START)
        .ok_or_else(|| ParseError::missing_label("__NEXT_DATA__"))?
        + DATA_START.len();
    let end = html[start..]
        .find(DATA_END)
        .ok_or_else(|| ParseError::missing_label("__NEXT_DATA__"))?
        + start;

    let data: Value = serde_json::from_str(&html[start..end])
        .map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let groups = data
        .pointer(PROJECTS_POINTER)
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::missing_field(PROJECTS_POINTER))?;

    let mut projects = Vec::new();
    for group in groups.values() {
        let list = group
            .as_array()
            .ok_or_else(|| ParseError::missing_field(PROJECTS_POINTER))?;
        projects.extend(list.iter().cloned());
    }
    Ok(projects)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDeviations {
    /// Listed before, gone now
    pub missed: Vec<Value>,
    /// Listed now, unknown before
    pub new: Vec<Value>,
}

impl ProjectDeviations {
    pub fn is_empty(&self) -> bool {
        self.missed.is_empty() && self.new.is_empty()
    }

    /// Notification text, one line per non-empty side
    pub fn render(&self) -> String {
        let mut lines = vec![CHANGED_HEADER.to_string()];
        if !self.new.is_empty() {
            lines.push(format!("New: {}", labels(&self.new)));
        }
        if !self.missed.is_empty() {
            lines.push(format!("Missed: {}", labels(&self.missed)));
        }
        lines.join("\n")
    }
}

pub fn find_deviations(previous: &[Value], current: &[Value]) -> ProjectDeviations {
    ProjectDeviations {
        missed: previous
            .iter()
            .filter(|project| !current.contains(project))
            .cloned()
            .collect(),
        new: current
            .iter()
            .filter(|project| !previous.contains(project))
            .cloned()
            .collect(),
    }
}

/// Display name of a catalogue entry
pub fn project_label(project: &Value) -> String {
    if let Some(name) = project.as_str() {
        return name.to_string();
    }
    ["name", "title", "slug"]
        .iter()
        .find_map(|key| project.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| project.to_string())
}

fn labels(projects: &[Value]) -> String {
    projects
        .iter()
        .map(project_label)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct ProjectTracker {
    probe: ApiProbe,
    snapshots: Arc<dyn ProjectSnapshotStore>,
    owners: Arc<dyn NodeStore>,
    notifier: Arc<dyn Notifier>,
    url: String,
    timeout: Duration,
}

impl ProjectTracker {
    pub fn new(
        snapshots: Arc<dyn ProjectSnapshotStore>,
        owners: Arc<dyn NodeStore>,
        notifier: Arc<dyn Notifier>,
        url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            probe: ApiProbe::new(),
            snapshots,
            owners,
            notifier,
            url,
            timeout,
        }
    }

    pub fn from_config(
        config: &Config,
        snapshots: Arc<dyn ProjectSnapshotStore>,
        owners: Arc<dyn NodeStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            snapshots,
            owners,
            notifier,
            config.project_tracker.url.clone(),
            config.request_timeout(),
        )
    }

    /// Fetch the catalogue and diff it against the stored snapshot
    ///
    /// A snapshot is stored on the first run and whenever the catalogue
    /// changed. Fetch and extraction failures leave the stored snapshot alone.
    pub async fn check_updates(&self) -> Result<ProjectDeviations> {
        let reply = self.probe.get(&self.url, self.timeout).await?;
        if !reply.is_usable() {
            return Err(anyhow!(
                "Project catalogue {} answered {}",
                self.url,
                reply.status
            ));
        }
        let current = extract_projects(&reply.body)?;

        let deviations = match self.snapshots.last_snapshot().await? {
            Some(previous) => find_deviations(&previous.projects, &current),
            None => {
                info!("Recording baseline of {} projects", current.len());
                self.save(current).await?;
                return Ok(ProjectDeviations::default());
            }
        };

        if deviations.is_empty() {
            debug!("Project catalogue unchanged ({} projects)", current.len());
        } else {
            info!(
                "Project catalogue changed: {} new, {} missed",
                deviations.new.len(),
                deviations.missed.len()
            );
            self.save(current).await?;
        }
        Ok(deviations)
    }

    /// One scheduled run: diff, then notify every owner of a change
    pub async fn run(&self) -> Result<ProjectDeviations> {
        let deviations = self.check_updates().await?;
        if deviations.is_empty() {
            return Ok(deviations);
        }

        let text = deviations.render();
        for owner_id in self.owners.list_owners().await? {
            if let Err(e) = self.notifier.send(owner_id, &text).await {
                warn!("Project update for owner {} not delivered: {}", owner_id, e);
            }
        }
        Ok(deviations)
    }

    async fn save(&self, projects: Vec<Value>) -> Result<()> {
        self.snapshots
            .save_snapshot(&ProjectSnapshot {
                checked_at: Utc::now(),
                projects,
            })
            .await
    }
}
