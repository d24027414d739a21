//! Database connection and transactions
//!
//! No connection outlives the call that opened it: every read or write
//! connects, migrates if needed, runs one transaction and closes.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, ErrorKind, StorageError};
use crate::migrations::run_migrations;
use crate::Result;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long a connection waits on a conflicting transaction before the
    /// operation fails.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection at the current schema version.
    pub fn connect(&self) -> Result<Connection> {
        self.open_connection().map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to open database");
            StorageError::Connection(e)
        })
    }

    fn open_connection(&self) -> std::result::Result<Connection, EngineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;

        // WAL so readers work from a snapshot and never block the writer
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&mut conn)?;
        Ok(conn)
    }

    /// Run `f` inside a read-only transaction on its own connection.
    pub fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, EngineError>,
    {
        self.run(TransactionBehavior::Deferred, ErrorKind::Read, f)
    }

    /// Run `f` inside a read-write transaction on its own connection and
    /// commit it.
    pub fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, EngineError>,
    {
        self.run(TransactionBehavior::Immediate, ErrorKind::Write, f)
    }

    fn run<F, T>(&self, behavior: TransactionBehavior, kind: ErrorKind, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, EngineError>,
    {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(|e| StorageError::new(kind, e))?;
        let result = f(&tx).map_err(|e| StorageError::new(kind, e))?;
        tx.commit().map_err(|e| StorageError::new(kind, e))?;
        Ok(result)
    }
}
