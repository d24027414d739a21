//! PondPilot Core
//!
//! Keeps user-imported data sources available across restarts without a
//! network round-trip. [`FileStore`] is the entry point; construct it once
//! and share clones wherever persistence is needed.

mod config;
mod error;
mod files;

pub use config::Config;
pub use error::CoreError;
pub use files::FileStore;

pub use pondpilot_storage::{
    ErrorKind, Key, MemoryBackend, Record, RecordBackend, SqliteBackend, StorageError,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
