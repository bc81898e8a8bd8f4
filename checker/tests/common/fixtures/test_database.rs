//! Test database utilities backed by a temporary SQLite file

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

use node_checker::database::Database;

pub struct TestDatabase {
    pub database: Arc<Database>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nodes.db");
        let database = Database::new(path.to_str().expect("utf-8 path")).await?;

        Ok(Self {
            database: Arc::new(database),
            _temp_dir: temp_dir,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        self.database.pool()
    }
}
