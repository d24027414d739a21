//! PondPilot Storage Layer
//!
//! Keyed record store for imported data sources. One database, one
//! collection (`data-source`), records addressed by their `id`.
//! Every operation runs in its own transaction on its own connection.

mod backend;
mod database;
mod error;
mod memory;
mod migrations;
mod record;
mod sqlite;

pub use backend::RecordBackend;
pub use database::Database;
pub use error::{EngineError, ErrorKind, StorageError};
pub use memory::MemoryBackend;
pub use record::{Key, Record};
pub use sqlite::SqliteBackend;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Name of the database; the file on disk is `pondpilot.db`.
pub const DB_NAME: &str = "pondpilot";

/// Name of the record store inside the database.
pub const STORE_NAME: &str = "data-source";
