//! SQLite-backed key-value store for favorites and settings.
//!
//! The database lives at `XDG_CONFIG_HOME/gallery-feed/settings.sqlite` by default
//! and holds a single `kv` table.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use directories::ProjectDirs;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::kv::KeyValueStore;
use crate::error::{GalleryError, Result};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at the default XDG location, starting
    /// over if the existing file is unreadable.
    pub fn open_default() -> anyhow::Result<Self> {
        let db_path = Self::default_path()?;
        match Self::open(&db_path) {
            Ok(store) => Ok(store),
            Err(GalleryError::Storage(e)) => {
                warn!(error = %e, "Settings database unreadable");
                Ok(Self::recover(&db_path)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the default database path, creating its directory.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "gallery-feed")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        Ok(config_dir.join("settings.sqlite"))
    }

    /// Opens or creates the database at `path`.
    ///
    /// Uses WAL journaling with `synchronous = NORMAL`; the data is small and
    /// rewritten on every change.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let store = Self::with_connection(conn)?;
        info!("Opened settings store at {:?}", path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        debug!("kv table created/verified");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Renames a corrupted database aside and starts a fresh one.
    pub fn recover(path: &Path) -> Result<Self> {
        warn!("Handling potential database corruption at {:?}", path);

        let backup_path = path.with_extension("sqlite.corrupted");
        if path.exists() {
            std::fs::rename(path, &backup_path)?;
            warn!("Backed up corrupted database to {:?}", backup_path);
        }

        Self::open(path)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.lock().execute(
            "
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value, Self::now()],
        )?;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM kv WHERE key = ?1")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;

        debug!("Removed {} keys", keys.len());
        Ok(())
    }
}
