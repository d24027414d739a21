//! SQLite-backed record store

use async_trait::async_trait;
use rusqlite::OptionalExtension;

use crate::backend::RecordBackend;
use crate::database::Database;
use crate::error::{EngineError, ErrorKind, StorageError};
use crate::record::{Key, Record};
use crate::Result;

/// Durable record store. Blocking engine work runs on tokio's blocking pool,
/// one fresh connection per call.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }
}

async fn run_blocking<F, T>(kind: ErrorKind, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::new(kind, e))?
}

#[async_trait]
impl RecordBackend for SqliteBackend {
    async fn open(&self) -> Result<()> {
        let db = self.db.clone();
        run_blocking(ErrorKind::Connection, move || db.connect().map(|_| ())).await
    }

    async fn put(&self, record: Record) -> Result<()> {
        let text =
            serde_json::to_string(&record).map_err(|e| StorageError::new(ErrorKind::Write, e))?;
        let db = self.db.clone();
        let id = record.id().clone();

        run_blocking(ErrorKind::Write, move || {
            db.write(|tx| {
                tx.execute(
                    r#"INSERT OR REPLACE INTO "data-source" (id, record) VALUES (?1, ?2)"#,
                    rusqlite::params![id, text],
                )?;
                Ok(())
            })
        })
        .await?;

        tracing::debug!(key = %record.id(), "Saved record");
        Ok(())
    }

    async fn get(&self, id: &Key) -> Result<Option<Record>> {
        let db = self.db.clone();
        let key = id.clone();

        let record = run_blocking(ErrorKind::Read, move || {
            db.read(|tx| {
                let text: Option<String> = tx
                    .query_row(
                        r#"SELECT record FROM "data-source" WHERE id = ?1"#,
                        [&key],
                        |row| row.get(0),
                    )
                    .optional()?;
                text.map(|t| serde_json::from_str::<Record>(&t))
                    .transpose()
                    .map_err(EngineError::from)
            })
        })
        .await?;

        tracing::debug!(key = %id, found = record.is_some(), "Read record");
        Ok(record)
    }

    async fn delete(&self, id: &Key) -> Result<()> {
        let db = self.db.clone();
        let key = id.clone();

        let removed = run_blocking(ErrorKind::Write, move || {
            db.write(|tx| {
                let removed =
                    tx.execute(r#"DELETE FROM "data-source" WHERE id = ?1"#, [&key])?;
                Ok(removed)
            })
        })
        .await?;

        tracing::debug!(key = %id, removed, "Deleted record");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let db = self.db.clone();

        let records = run_blocking(ErrorKind::Read, move || {
            db.read(|tx| {
                let mut stmt = tx.prepare(r#"SELECT record FROM "data-source" ORDER BY id"#)?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut records = Vec::new();
                for text in rows {
                    records.push(serde_json::from_str::<Record>(&text?)?);
                }
                Ok(records)
            })
        })
        .await?;

        tracing::debug!(count = records.len(), "Listed records");
        Ok(records)
    }
}
