//! File store
//!
//! Async save/get/delete/list of imported data-source records. Each call is
//! an independent unit: it opens its own connection and transaction, and
//! nothing is shared between calls except the persisted records.

use serde_json::{Map, Value};
use std::sync::Arc;

use pondpilot_storage::{
    Database, Key, MemoryBackend, Record, RecordBackend, SqliteBackend, StorageError,
};

use crate::config::Config;
use crate::Result;

type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Clone)]
pub struct FileStore {
    backend: Arc<dyn RecordBackend>,
}

impl FileStore {
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Durable store at the configured location. The database is created on
    /// first use.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let db = Database::new(config.database_path()).with_busy_timeout(config.busy_timeout());

        tracing::info!(path = %db.path().display(), "Using file store");

        Ok(Self::new(Arc::new(SqliteBackend::new(db))))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Check the store can be opened, running the schema upgrade if needed.
    pub async fn check(&self) -> StorageResult<()> {
        self.backend.open().await
    }

    /// Store `{id, ...data}`, replacing any record with the same id.
    pub async fn save_file(
        &self,
        id: impl Into<Key>,
        data: Map<String, Value>,
    ) -> StorageResult<bool> {
        let record = Record::new(id, data);
        let key = record.id().clone();

        self.backend.put(record).await.inspect_err(|e| {
            tracing::warn!(key = %key, error = %e, "Failed to save file");
        })?;
        Ok(true)
    }

    /// `Ok(None)` when nothing is stored under `id`.
    pub async fn get_file(&self, id: impl Into<Key>) -> StorageResult<Option<Record>> {
        let key = id.into();
        self.backend.get(&key).await.inspect_err(|e| {
            tracing::warn!(key = %key, error = %e, "Failed to read file");
        })
    }

    pub async fn delete_file(&self, id: impl Into<Key>) -> StorageResult<bool> {
        let key = id.into();
        self.backend.delete(&key).await.inspect_err(|e| {
            tracing::warn!(key = %key, error = %e, "Failed to delete file");
        })?;
        Ok(true)
    }

    /// Every stored record, ascending by id.
    pub async fn list_files(&self) -> StorageResult<Vec<Record>> {
        self.backend.list().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to list files");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pondpilot_storage::ErrorKind;
    use serde_json::json;
    use std::path::PathBuf;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    /// One store per engine, so every property is checked against both.
    fn stores(dir: &tempfile::TempDir) -> Vec<FileStore> {
        vec![
            FileStore::in_memory(),
            FileStore::open(&Config::new(dir.path().to_path_buf())).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            let data = payload(json!({
                "name": "sales.parquet",
                "size": 4096,
                "bytes": [80, 65, 82, 49],
                "meta": { "sheet": null }
            }));
            assert!(store.save_file("sales", data).await.unwrap());

            let record = store.get_file("sales").await.unwrap().unwrap();
            assert_eq!(
                record.to_value(),
                json!({
                    "id": "sales",
                    "name": "sales.parquet",
                    "size": 4096,
                    "bytes": [80, 65, 82, 49],
                    "meta": { "sheet": null }
                })
            );
        }
    }

    #[tokio::test]
    async fn test_argument_id_wins() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            store
                .save_file("real", payload(json!({ "id": "fake", "x": 1 })))
                .await
                .unwrap();

            assert!(store.get_file("fake").await.unwrap().is_none());
            let record = store.get_file("real").await.unwrap().unwrap();
            assert_eq!(record.to_value(), json!({ "id": "real", "x": 1 }));
        }
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            store.save_file("keep", Map::new()).await.unwrap();

            assert!(store.delete_file("missing").await.unwrap());
            assert!(store.delete_file("missing").await.unwrap());
            assert_eq!(ids(&store.list_files().await.unwrap()), vec!["keep"]);

            assert!(store.delete_file("keep").await.unwrap());
            assert!(store.delete_file("keep").await.unwrap());
            assert!(store.list_files().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_overwrite_drops_old_fields() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            store
                .save_file("f", payload(json!({ "a": 1, "shared": "old" })))
                .await
                .unwrap();
            store
                .save_file("f", payload(json!({ "b": 2, "shared": "new" })))
                .await
                .unwrap();

            let record = store.get_file("f").await.unwrap().unwrap();
            assert_eq!(
                record.to_value(),
                json!({ "id": "f", "b": 2, "shared": "new" })
            );
            assert_eq!(store.list_files().await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_list_is_complete_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            for id in ["c", "a", "b"] {
                store
                    .save_file(id, payload(json!({ "name": id })))
                    .await
                    .unwrap();
            }

            let records = store.list_files().await.unwrap();
            assert_eq!(ids(&records), vec!["a", "b", "c"]);
            assert_eq!(records[0].get("name"), Some(&json!("a")));
        }
    }

    #[tokio::test]
    async fn test_delete_removes_from_list() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            store.save_file("x", Map::new()).await.unwrap();
            store.save_file("y", Map::new()).await.unwrap();
            store.delete_file("x").await.unwrap();

            assert_eq!(ids(&store.list_files().await.unwrap()), vec!["y"]);
        }
    }

    #[tokio::test]
    async fn test_missing_read_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        for store in stores(&dir) {
            assert!(store.get_file("does-not-exist").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf());

        let first = FileStore::open(&config).unwrap();
        first
            .save_file(42, payload(json!({ "name": "numbers.csv" })))
            .await
            .unwrap();
        drop(first);

        let second = FileStore::open(&config).unwrap();
        second.check().await.unwrap();
        let record = second.get_file(42).await.unwrap().unwrap();
        assert_eq!(record.id(), &Key::Integer(42));
        assert_eq!(record.get("name"), Some(&json!("numbers.csv")));
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&Config::new(dir.path().to_path_buf())).unwrap();
        store.check().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save_file(format!("file-{}", i), payload(json!({ "n": i })))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.list_files().await.unwrap().len(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_open_on_fresh_directory() {
        for round in 0..10 {
            let dir = tempfile::tempdir().unwrap();
            // No warm-up: the first calls race to create and upgrade the database
            let store = FileStore::open(&Config::new(dir.path().join("data"))).unwrap();

            let mut handles = Vec::new();
            for i in 0..16 {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    if i % 4 == 0 {
                        store.list_files().await.map(|_| ())
                    } else {
                        store
                            .save_file(format!("file-{}", i), payload(json!({ "round": round })))
                            .await
                            .map(|_| ())
                    }
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(store.list_files().await.unwrap().len(), 12);
        }
    }

    #[tokio::test]
    async fn test_unusable_location_fails_with_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the data directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = FileStore::open(&Config::new(blocker)).unwrap();

        let err = store.save_file("a", Map::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        let err = store.get_file("a").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = Config::new(PathBuf::new());
        assert!(matches!(
            FileStore::open(&config),
            Err(crate::CoreError::Config(_))
        ));
    }
}
