use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Storage quota exceeded: writing {key} needs {required} bytes, quota is {quota}")]
    QuotaExceeded { key: String, required: u64, quota: u64 },
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// String key/value storage backed by a single SQLite table.
///
/// This is the on-disk equivalent of browser local storage: every
/// collection is one row holding its JSON text.
pub struct Database {
    conn: Mutex<Connection>,
    quota_bytes: Option<u64>,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::initialize_schema(&conn)?;

        tracing::debug!(path = %db_path.display(), "local storage opened");
        Ok(Database {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    /// Open a throwaway database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Database {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    /// Cap the total stored bytes (keys plus values)
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Get the stored string for a key
    pub fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store a string under a key, replacing any previous value
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        Self::check_quota(&conn, self.quota_bytes, key, value)?;
        Self::upsert(&conn, key, value)?;
        Ok(())
    }

    /// Store many key/value pairs in one transaction; either all land or none do
    pub fn set_items(&self, items: &[(String, String)]) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        for (key, value) in items {
            Self::check_quota(&tx, self.quota_bytes, key, value)?;
            Self::upsert(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove a key; removing a missing key is not an error
    pub fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM local_storage WHERE key = ?1",
            rusqlite::params![key],
        )?;
        Ok(())
    }

    /// All stored keys in ascending order
    pub fn keys(&self) -> Result<Vec<String>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM local_storage ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Stored keys starting with `prefix`, ascending
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DatabaseError> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    fn upsert(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, crate::utils::now_timestamp()],
        )?;
        Ok(())
    }

    fn check_quota(
        conn: &Connection,
        quota: Option<u64>,
        key: &str,
        value: &str,
    ) -> Result<(), DatabaseError> {
        let Some(quota) = quota else {
            return Ok(());
        };
        let others: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM local_storage WHERE key != ?1",
            rusqlite::params![key],
            |row| row.get(0),
        )?;
        let required = others.max(0) as u64 + (key.len() + value.len()) as u64;
        if required > quota {
            return Err(DatabaseError::QuotaExceeded {
                key: key.to_string(),
                required,
                quota,
            });
        }
        Ok(())
    }
}
