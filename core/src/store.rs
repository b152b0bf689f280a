//! Session snapshot persistence
//!
//! Best-effort durable copy of a session record, keyed by primary session id.
//! The in-memory registry stays the authority.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{expand_path, StoreConfig, StoreMode};
use crate::session::SessionRecord;

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> anyhow::Result<Option<SessionRecord>>;
    async fn set(&self, key: &str, record: &SessionRecord) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// Build the store selected in config
pub fn from_config(config: &StoreConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.mode {
        StoreMode::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreMode::File => {
            let directory = expand_path(&config.directory);
            std::fs::create_dir_all(&directory)?;
            tracing::info!("Persisting sessions to {:?}", directory);
            Ok(Arc::new(FileStore::new(directory)))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<SessionRecord>> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, record: &SessionRecord) -> anyhow::Result<()> {
        self.records.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.records.remove(key);
        Ok(())
    }
}

/// One JSON file per session: `<directory>/<key>.json`.
///
/// Writes go through `<key>.json.tmp` and a rename, one at a time per key.
pub struct FileStore {
    directory: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileStore {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            write_locks: DashMap::new(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            anyhow::bail!("Invalid session key: {:?}", key);
        }
        Ok(self.directory.join(format!("{}.json", key)))
    }

    fn write_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(key.to_string())
            .or_default()
            .value()
            .clone()
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<SessionRecord>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, record: &SessionRecord) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(record)?;

        let lock = self.write_lock(key);
        let _guard = lock.lock().await;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        let lock = self.write_lock(key);
        let _guard = lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(session: &str) -> SessionRecord {
        let mut record = SessionRecord::new();
        record.session = session.to_string();
        record.args = vec!["-i".into(), "input".into()];
        record
    }

    async fn exercise(store: &dyn SessionStore) {
        assert!(store.get("abc").await.unwrap().is_none());

        let r = record("abc");
        store.set("abc", &r).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), Some(r));

        store.delete("abc").await.unwrap();
        assert!(store.get("abc").await.unwrap().is_none());
        store.delete("abc").await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileStore::new(dir.path().to_path_buf())).await;
    }

    #[tokio::test]
    async fn file_store_writes_json_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.set("abc", &record("abc")).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("abc.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["session"], "abc");
    }

    #[tokio::test]
    async fn file_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        assert!(store.set("../evil", &record("x")).await.is_err());
        assert!(store.get("a/b").await.is_err());
        assert!(store.delete("").await.is_err());
        assert!(store.get("..").await.is_err());
        assert!(store.get(".").await.is_err());
    }

    #[tokio::test]
    async fn file_store_accepts_dotted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.set("a..b", &record("a..b")).await.unwrap();
        assert_eq!(store.get("a..b").await.unwrap().unwrap().session, "a..b");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn file_store_concurrent_writes_never_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().to_path_buf()));

        let mut big = record("abc");
        big.args = (0..200).map(|i| format!("-arg{}", i)).collect();
        let small = record("abc");

        for _ in 0..100 {
            let (a, b) = (store.clone(), store.clone());
            let (big, small) = (big.clone(), small.clone());
            let first = tokio::spawn(async move { a.set("abc", &big).await });
            let second = tokio::spawn(async move { b.set("abc", &small).await });
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();

            let stored = store.get("abc").await.unwrap().unwrap();
            assert!(stored.args.len() == 200 || stored.args.len() == 2);
        }
        assert!(!dir.path().join("abc.json.tmp").exists());
    }

    #[test]
    fn from_config_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("sessions");
        let config = StoreConfig {
            mode: StoreMode::File,
            directory: target.clone(),
        };
        from_config(&config).unwrap();
        assert!(target.is_dir());
    }
}
