use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::agents::AgentStore;
use crate::error::StoreResult;
use crate::migrations;
use crate::missions::MissionStore;

/// Handle to the backing database. Cheap to clone; every store opened from it
/// gets its own connection, so callers on different threads never share one.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    /// Opens (creating if needed) the database file and brings the schema up to date.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db directory {}", parent.display()))?;
        }
        let db = Self {
            path: path.to_path_buf(),
            busy_timeout,
        };
        let mut conn = db
            .connect()
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(journal_mode = %mode, path = %path.display(), "database opened");
        migrations::migrate(&mut conn)?;
        Ok(db)
    }

    pub fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    pub fn agents(&self) -> StoreResult<AgentStore> {
        Ok(AgentStore::new(self.connect()?))
    }

    pub fn missions(&self) -> StoreResult<MissionStore> {
        Ok(MissionStore::new(self.connect()?))
    }

    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.connect()?;
        migrations::current_version(&conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}
