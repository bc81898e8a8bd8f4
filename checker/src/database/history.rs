//! Check history operations.

use anyhow::Result;
use sqlx::Row;
use tracing::{debug, error};

use super::records::CheckRecord;
use super::Database;
use crate::health::types::HealthVerdict;

impl Database {
    pub async fn store_check_record(&self, record: &CheckRecord) -> Result<()> {
        match sqlx::query(
            r#"
            INSERT INTO check_history (node_id, checked_at, ok, message, reward)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.node_id)
        .bind(record.checked_at)
        .bind(record.verdict.is_ok())
        .bind(record.verdict.message())
        .bind(record.verdict.reward())
        .execute(&self.pool)
        .await
        {
            Ok(_) => {
                debug!("Check record stored for node {}", record.node_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to store check record for node {}: {}", record.node_id, e);
                Err(e.into())
            }
        }
    }

    /// Most recent checks of a node, newest first
    pub async fn get_check_history(&self, node_id: i64, limit: i64) -> Result<Vec<CheckRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT node_id, checked_at, ok, message, reward
            FROM check_history
            WHERE node_id = ?
            ORDER BY checked_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(node_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(CheckRecord {
                node_id: row.try_get("node_id")?,
                checked_at: row.try_get("checked_at")?,
                verdict: HealthVerdict::restore(
                    row.try_get("ok")?,
                    row.try_get("message")?,
                    row.try_get("reward")?,
                ),
            });
        }
        Ok(records)
    }
}
