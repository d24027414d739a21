//! In-memory record store for tests and ephemeral sessions

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::RecordBackend;
use crate::record::{Key, Record};
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<RwLock<BTreeMap<Key, Record>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, record: Record) -> Result<()> {
        tracing::debug!(key = %record.id(), "Saved record");
        self.records.write().insert(record.id().clone(), record);
        Ok(())
    }

    async fn get(&self, id: &Key) -> Result<Option<Record>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn delete(&self, id: &Key) -> Result<()> {
        let removed = self.records.write().remove(id).is_some();
        tracing::debug!(key = %id, removed, "Deleted record");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.records.read().values().cloned().collect())
    }
}
