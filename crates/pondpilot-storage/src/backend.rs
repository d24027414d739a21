//! Storage-service interface shared by the SQLite and in-memory engines

use async_trait::async_trait;

use crate::record::{Key, Record};
use crate::Result;

/// One named collection of records addressed by primary key.
///
/// Every method is its own atomic unit of work. Implementations hold no
/// state between calls beyond the persisted records themselves.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Check that the store can be opened, upgrading it if required.
    async fn open(&self) -> Result<()>;

    /// Insert `record`, replacing any record with the same key.
    async fn put(&self, record: Record) -> Result<()>;

    /// `Ok(None)` when no record has `id`.
    async fn get(&self, id: &Key) -> Result<Option<Record>>;

    /// Removing an absent key is not an error.
    async fn delete(&self, id: &Key) -> Result<()>;

    /// All records in ascending key order.
    async fn list(&self) -> Result<Vec<Record>>;
}
