//! Project catalogue snapshots.

use anyhow::Result;
use sqlx::Row;
use tracing::{debug, error};

use super::records::ProjectSnapshot;
use super::Database;

impl Database {
    pub async fn store_project_snapshot(&self, snapshot: &ProjectSnapshot) -> Result<()> {
        let projects = serde_json::to_string(&snapshot.projects)?;

        match sqlx::query("INSERT INTO project_snapshots (checked_at, projects) VALUES (?, ?)")
            .bind(snapshot.checked_at)
            .bind(projects)
            .execute(&self.pool)
            .await
        {
            Ok(_) => {
                debug!("Stored snapshot of {} projects", snapshot.projects.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to store project snapshot: {}", e);
                Err(e.into())
            }
        }
    }

    /// Newest snapshot, `None` before the first tracker run
    pub async fn get_last_project_snapshot(&self) -> Result<Option<ProjectSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT checked_at, projects
            FROM project_snapshots
            ORDER BY checked_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let projects: String = row.try_get("projects")?;
        Ok(Some(ProjectSnapshot {
            checked_at: row.try_get("checked_at")?,
            projects: serde_json::from_str(&projects)?,
        }))
    }
}
