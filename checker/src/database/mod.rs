//! Database layer for the node checker.
//!
//! SQLite persistence for:
//! - Nodes with their current status (`nodes`)
//! - Check history (`check_history`)
//! - Project catalogue snapshots (`project_snapshots`)
//!
//! Submodules:
//! - `records` - record types (entities)
//! - `nodes` - node CRUD and status updates
//! - `history` - check history
//! - `projects` - project catalogue snapshots

mod history;
mod nodes;
mod projects;
mod records;

pub use records::*;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

use crate::health::types::NodeState;

/// Storage consumed by the health monitor and the node service
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Owners with at least one node
    async fn list_owners(&self) -> Result<Vec<i64>>;

    /// Nodes of `owner`, newest first; list position is the 1-based ordinal
    async fn list_nodes(&self, owner_id: i64) -> Result<Vec<NodeRecord>>;

    async fn create_node(&self, node: &NewNode) -> Result<NodeRecord>;

    /// Delete the node at `ordinal` together with its history
    async fn delete_node(&self, owner_id: i64, ordinal: usize) -> Result<Option<NodeRecord>>;

    async fn save_state(&self, node_id: i64, state: &NodeState) -> Result<()>;

    async fn append_history(&self, record: &CheckRecord) -> Result<()>;
}

/// Last known project catalogue, consumed by the project tracker
#[async_trait]
pub trait ProjectSnapshotStore: Send + Sync {
    async fn last_snapshot(&self) -> Result<Option<ProjectSnapshot>>;

    async fn save_snapshot(&self, snapshot: &ProjectSnapshot) -> Result<()>;
}

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Opening database at {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("Failed to create database directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_url, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;

        info!("Database ready");
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let nodes_table_sql = r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                node_type TEXT NOT NULL,
                host TEXT NOT NULL,
                port INTEGER,
                ssh_user TEXT,
                ssh_credential TEXT,
                terminal_name TEXT,
                use_sudo BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                last_checked_at DATETIME,
                last_ok BOOLEAN,
                last_message TEXT,
                last_reward REAL,
                last_notified_ok BOOLEAN,
                consecutive_same_count INTEGER NOT NULL DEFAULT 0
            )
        "#;

        let history_table_sql = r#"
            CREATE TABLE IF NOT EXISTS check_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                node_id INTEGER NOT NULL,
                checked_at DATETIME NOT NULL,
                ok BOOLEAN NOT NULL,
                message TEXT NOT NULL,
                reward REAL NOT NULL DEFAULT 0
            )
        "#;

        let snapshots_table_sql = r#"
            CREATE TABLE IF NOT EXISTS project_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                checked_at DATETIME NOT NULL,
                projects TEXT NOT NULL
            )
        "#;

        let statements = [
            ("nodes table", nodes_table_sql),
            (
                "nodes index",
                "CREATE INDEX IF NOT EXISTS idx_nodes_owner_created ON nodes(owner_id, created_at DESC)",
            ),
            ("check_history table", history_table_sql),
            ("project_snapshots table", snapshots_table_sql),
            (
                "check_history index",
                "CREATE INDEX IF NOT EXISTS idx_history_node_checked ON check_history(node_id, checked_at DESC)",
            ),
        ];

        for (name, sql) in statements {
            if let Err(e) = sqlx::query(sql).execute(&self.pool).await {
                error!("Failed to create {}: {}", name, e);
                return Err(e.into());
            }
        }

        info!("Database tables initialized");
        Ok(())
    }
}

#[async_trait]
impl NodeStore for Database {
    async fn list_owners(&self) -> Result<Vec<i64>> {
        self.get_owner_ids().await
    }

    async fn list_nodes(&self, owner_id: i64) -> Result<Vec<NodeRecord>> {
        self.get_nodes_for_owner(owner_id).await
    }

    async fn create_node(&self, node: &NewNode) -> Result<NodeRecord> {
        self.insert_node(node).await
    }

    async fn delete_node(&self, owner_id: i64, ordinal: usize) -> Result<Option<NodeRecord>> {
        self.delete_node_at(owner_id, ordinal).await
    }

    async fn save_state(&self, node_id: i64, state: &NodeState) -> Result<()> {
        self.update_node_state(node_id, state).await
    }

    async fn append_history(&self, record: &CheckRecord) -> Result<()> {
        self.store_check_record(record).await
    }
}

#[async_trait]
impl ProjectSnapshotStore for Database {
    async fn last_snapshot(&self) -> Result<Option<ProjectSnapshot>> {
        self.get_last_project_snapshot().await
    }

    async fn save_snapshot(&self, snapshot: &ProjectSnapshot) -> Result<()> {
        self.store_project_snapshot(snapshot).await
    }
}
