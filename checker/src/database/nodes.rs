//! Node CRUD and status updates.

use anyhow::{anyhow, Result};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

use super::records::{NewNode, NodeRecord};
use super::Database;
use crate::health::types::{HealthVerdict, NodeState};

const NODE_COLUMNS: &str = r#"
    id, owner_id, node_type, host, port, ssh_user, ssh_credential, terminal_name,
    use_sudo, created_at, last_checked_at, last_ok, last_message, last_reward,
    last_notified_ok, consecutive_same_count
"#;

impl Database {
    pub async fn get_owner_ids(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT DISTINCT owner_id FROM nodes ORDER BY owner_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("owner_id").map_err(Into::into))
            .collect()
    }

    pub async fn get_nodes_for_owner(&self, owner_id: i64) -> Result<Vec<NodeRecord>> {
        let sql = format!(
            "SELECT {} FROM nodes WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
            NODE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        debug!("Loaded {} nodes for owner {}", rows.len(), owner_id);
        rows.iter().map(node_from_row).collect()
    }

    pub async fn get_node(&self, node_id: i64) -> Result<Option<NodeRecord>> {
        let sql = format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(node_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(node_from_row).transpose()
    }

    pub async fn insert_node(&self, node: &NewNode) -> Result<NodeRecord> {
        let created_at = Utc::now();
        let credential = node
            .ssh_credential
            .as_ref()
            .map(|credential| credential.expose_secret().to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO nodes (
                owner_id, node_type, host, port, ssh_user, ssh_credential,
                terminal_name, use_sudo, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(node.owner_id)
        .bind(node.node_type.as_str())
        .bind(&node.host)
        .bind(node.port.map(i64::from))
        .bind(&node.ssh_user)
        .bind(credential)
        .bind(&node.terminal_name)
        .bind(node.use_sudo)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(e) => {
                error!("Failed to store {} node for owner {}: {}", node.node_type, node.owner_id, e);
                return Err(e.into());
            }
        };

        info!(
            "Stored {} node {} for owner {} as #{}",
            node.node_type, node.host, node.owner_id, id
        );

        self.get_node(id)
            .await?
            .ok_or_else(|| anyhow!("Node #{} vanished after insert", id))
    }

    /// Remove the node at the 1-based `ordinal` of the owner's list and its history
    pub async fn delete_node_at(&self, owner_id: i64, ordinal: usize) -> Result<Option<NodeRecord>> {
        let nodes = self.get_nodes_for_owner(owner_id).await?;
        let Some(node) = ordinal.checked_sub(1).and_then(|index| nodes.into_iter().nth(index))
        else {
            debug!("Owner {} has no node #{}", owner_id, ordinal);
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM check_history WHERE node_id = ?")
            .bind(node.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM nodes WHERE id = ? AND owner_id = ?")
            .bind(node.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted {} node {} of owner {}", node.node_type, node.host, owner_id);
        Ok(Some(node))
    }

    pub async fn update_node_state(&self, node_id: i64, state: &NodeState) -> Result<()> {
        let verdict = state.last_verdict.as_ref();

        sqlx::query(
            r#"
            UPDATE nodes SET
                last_checked_at = ?,
                last_ok = ?,
                last_message = ?,
                last_reward = ?,
                last_notified_ok = ?,
                consecutive_same_count = ?
            WHERE id = ?
            "#,
        )
        .bind(state.last_checked_at)
        .bind(verdict.map(HealthVerdict::is_ok))
        .bind(verdict.map(|v| v.message().to_string()))
        .bind(verdict.map(HealthVerdict::reward))
        .bind(state.last_notified_ok)
        .bind(i64::from(state.consecutive_same_count))
        .bind(node_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn node_from_row(row: &SqliteRow) -> Result<NodeRecord> {
    let port = row
        .try_get::<Option<i64>, _>("port")?
        .map(u16::try_from)
        .transpose()
        .map_err(|e| anyhow!("Stored port out of range: {}", e))?;

    let last_verdict = match row.try_get::<Option<bool>, _>("last_ok")? {
        Some(ok) => Some(HealthVerdict::restore(
            ok,
            row.try_get::<Option<String>, _>("last_message")?
                .unwrap_or_default(),
            row.try_get::<Option<f64>, _>("last_reward")?.unwrap_or(0.0),
        )),
        None => None,
    };

    let consecutive_same_count = row.try_get::<i64, _>("consecutive_same_count")?;

    Ok(NodeRecord {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        node_type: row.try_get("node_type")?,
        host: row.try_get("host")?,
        port,
        ssh_user: row.try_get("ssh_user")?,
        ssh_credential: row
            .try_get::<Option<String>, _>("ssh_credential")?
            .map(SecretString::from),
        terminal_name: row.try_get("terminal_name")?,
        use_sudo: row.try_get("use_sudo")?,
        created_at: row.try_get("created_at")?,
        state: NodeState {
            last_checked_at: row.try_get("last_checked_at")?,
            last_verdict,
            last_notified_ok: row.try_get("last_notified_ok")?,
            consecutive_same_count: u32::try_from(consecutive_same_count).unwrap_or(u32::MAX),
        },
    })
}
