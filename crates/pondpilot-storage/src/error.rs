//! Storage error types

use thiserror::Error;

/// Failure reported by the underlying engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    VersionTooNew { found: i32, supported: i32 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    /// The database could not be opened or upgraded.
    #[error("Connection error: {0}")]
    Connection(#[source] EngineError),

    /// A read transaction failed, or a stored record could not be decoded.
    #[error("Read error: {0}")]
    Read(#[source] EngineError),

    /// A write or delete transaction failed.
    #[error("Write error: {0}")]
    Write(#[source] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Read,
    Write,
}

impl StorageError {
    pub fn new(kind: ErrorKind, source: impl Into<EngineError>) -> Self {
        let source = source.into();
        match kind {
            ErrorKind::Connection => StorageError::Connection(source),
            ErrorKind::Read => StorageError::Read(source),
            ErrorKind::Write => StorageError::Write(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Connection(_) => ErrorKind::Connection,
            StorageError::Read(_) => ErrorKind::Read,
            StorageError::Write(_) => ErrorKind::Write,
        }
    }
}
