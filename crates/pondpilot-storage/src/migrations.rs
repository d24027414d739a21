//! Database migrations
//!
//! Schema v1: the `data-source` record store keyed by `id`.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::error::EngineError;

pub const SCHEMA_VERSION: i32 = 1;

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// Only runs when the on-disk version is behind, and every step is guarded
/// so a repeated run leaves existing rows untouched. A database written by a
/// newer schema is refused.
pub fn run_migrations(conn: &mut Connection) -> Result<(), EngineError> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(EngineError::VersionTooNew {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }
    if current_version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Another connection may have upgraded while we waited for the lock
    let current_version = get_schema_version(&tx)?;
    if current_version < 1 {
        migrate_v1(&tx)?;
    }
    if current_version < SCHEMA_VERSION {
        set_schema_version(&tx, SCHEMA_VERSION)?;
    }

    tx.commit()?;
    Ok(())
}

pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, EngineError> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(0);
    }

    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(version.unwrap_or(0))
}

pub(crate) fn set_schema_version(conn: &Connection, version: i32) -> Result<(), EngineError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<(), EngineError> {
    tracing::info!("Running migration v1: data-source store");

    // Untyped key column so integer and text keys keep their kind and sort
    // integers first.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS "data-source" (
            id PRIMARY KEY NOT NULL,
            record TEXT NOT NULL
        ) WITHOUT ROWID;
    "#,
    )?;

    Ok(())
}
