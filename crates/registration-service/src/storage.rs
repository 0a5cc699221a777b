//! File storage for registration records
//!
//! One pretty-printed JSON file per identifier under the data directory.
//! Writes to the same identifier are serialized through a per-identifier
//! mutex; different identifiers never contend.

use dispenser_common::{Error, PersistedRecord, Result, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Storage backend for registration records
pub struct RecordStore {
    data_dir: PathBuf,
    locks: Arc<KeyedLocks>,
}

impl RecordStore {
    /// Create a store rooted at `data_dir`. The directory must already exist.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    /// Path of the record file for an identifier
    pub fn path_for(&self, id: &UserId) -> PathBuf {
        self.data_dir.join(id.file_name())
    }

    /// Write a record, replacing any earlier record with the same identifier.
    /// Returns the path written.
    pub async fn save(&self, id: &UserId, record: &PersistedRecord) -> Result<PathBuf> {
        let json = record.to_pretty_json()?;
        let len = json.len();
        let path = self.path_for(id);

        let target = path.clone();
        self.locked(id, &path, move || tokio::fs::write(target, json))
            .await?;

        debug!("Wrote {} bytes to {}", len, path.display());
        Ok(path)
    }

    /// Read a record back, `None` when nothing is stored for the identifier
    pub async fn load(&self, id: &UserId) -> Result<Option<PersistedRecord>> {
        let path = self.path_for(id);

        let target = path.clone();
        let bytes = self
            .locked(id, &path, move || async move {
                match tokio::fs::read(&target).await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Run `op` while holding the identifier's lock.
    ///
    /// The lock, the file operation and the lock release run on a detached
    /// task, so a caller dropped mid-write (client disconnect) cannot let a
    /// second write to the same file start before the first one finishes.
    async fn locked<T, F, Fut>(&self, id: &UserId, path: &Path, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::io::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let locks = self.locks.clone();
        let id = id.clone();

        let task = tokio::spawn(async move {
            let entry = locks.acquire(&id).await;
            let result = {
                let _guard = entry.lock().await;
                op().await
            };
            locks.release(&id, entry).await;
            result
        });

        match task.await {
            Ok(result) => result.map_err(|e| Error::storage(path, e)),
            Err(e) => Err(Error::storage(path, std::io::Error::other(e))),
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.inner.lock().await.len()
    }
}

/// Map from identifier to the mutex guarding its file
#[derive(Default)]
struct KeyedLocks {
    inner: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn acquire(&self, id: &UserId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(id.clone()).or_default().clone()
    }

    /// Drop the map entry once no other request holds a handle to it
    async fn release(&self, id: &UserId, entry: Arc<Mutex<()>>) {
        let mut map = self.inner.lock().await;
        // One reference in the map, one held here
        if Arc::strong_count(&entry) == 2 {
            map.remove(id);
        }
        // Must happen while the map is still locked
        drop(entry);
    }
}
