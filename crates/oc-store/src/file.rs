use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use oc_types::Bucket;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::log::{self, LogRecord, LogWriter, SyncMode};
use crate::memory::InMemoryBucketStore;
use crate::traits::BucketStore;

/// Configuration for [`FileBucketStore`].
#[derive(Clone, Debug, Default)]
pub struct FileStoreConfig {
    pub sync_mode: SyncMode,
    /// Rewrite the log down to live records right after recovery.
    pub compact_on_open: bool,
}

/// Durable bucket store: an append-only operation log plus an in-memory index.
///
/// Every mutation is appended to the log before it is applied to the index,
/// so the index never holds data the log does not. Reads are served from the
/// index. On open the log is replayed to rebuild the index.
///
/// All writers go through one mutex around the log writer, which also makes
/// [`BucketStore::insert_new`] atomic.
pub struct FileBucketStore {
    path: PathBuf,
    index: InMemoryBucketStore,
    /// `None` once the store is closed.
    log: Mutex<Option<LogWriter>>,
    config: FileStoreConfig,
}

impl FileBucketStore {
    /// Open (or create) a store backed by the log file at `path`.
    pub fn open(path: impl AsRef<Path>, config: FileStoreConfig) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let index = InMemoryBucketStore::new();
        let records = log::replay(&path)?;
        let replayed = records.len();
        for record in records {
            match record {
                LogRecord::Put { bucket, key, value } => index.put(bucket, key, &value)?,
                LogRecord::Delete { bucket, key } => {
                    index.delete(bucket, key)?;
                }
            }
        }

        let writer = LogWriter::open(&path, config.sync_mode)?;
        let store = Self {
            path,
            index,
            log: Mutex::new(Some(writer)),
            config,
        };
        info!(
            path = %store.path.display(),
            replayed,
            records = store.index.total_records()?,
            "file store opened"
        );

        if store.config.compact_on_open {
            store.compact()?;
        }
        Ok(store)
    }

    /// Path to the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the log in bytes.
    pub fn log_size(&self) -> StoreResult<u64> {
        let guard = self.lock_log()?;
        guard.as_ref().map(LogWriter::offset).ok_or(StoreError::Closed)
    }

    /// Rewrite the log so it holds one `Put` per live record.
    pub fn compact(&self) -> StoreResult<()> {
        let mut guard = self.lock_log()?;
        if guard.is_none() {
            return Err(StoreError::Closed);
        }

        let mut live = Vec::new();
        for bucket in Bucket::ALL {
            for (key, value) in self.index.entries(bucket)? {
                live.push(LogRecord::Put { bucket, key, value });
            }
        }
        let count = live.len();
        *guard = Some(log::rewrite(&self.path, live, self.config.sync_mode)?);
        debug!(records = count, "log compacted");
        Ok(())
    }

    fn lock_log(&self) -> StoreResult<MutexGuard<'_, Option<LogWriter>>> {
        self.log
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl BucketStore for FileBucketStore {
    fn put(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<()> {
        let mut guard = self.lock_log()?;
        let log = guard.as_mut().ok_or(StoreError::Closed)?;
        log.append(&LogRecord::Put {
            bucket,
            key,
            value: value.to_vec(),
        })?;
        self.index.put(bucket, key, value)
    }

    fn insert_new(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<bool> {
        let mut guard = self.lock_log()?;
        let log = guard.as_mut().ok_or(StoreError::Closed)?;
        if self.index.contains(bucket, key)? {
            return Ok(false);
        }
        log.append(&LogRecord::Put {
            bucket,
            key,
            value: value.to_vec(),
        })?;
        self.index.insert_new(bucket, key, value)
    }

    fn get(&self, bucket: Bucket, key: u64) -> StoreResult<Vec<u8>> {
        self.index.get(bucket, key)
    }

    fn delete(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
        let mut guard = self.lock_log()?;
        let log = guard.as_mut().ok_or(StoreError::Closed)?;
        if !self.index.contains(bucket, key)? {
            return Ok(false);
        }
        log.append(&LogRecord::Delete { bucket, key })?;
        self.index.delete(bucket, key)
    }

    fn entries(&self, bucket: Bucket) -> StoreResult<Vec<(u64, Vec<u8>)>> {
        self.index.entries(bucket)
    }

    fn keys(&self, bucket: Bucket) -> StoreResult<Vec<u64>> {
        self.index.keys(bucket)
    }

    fn contains(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
        self.index.contains(bucket, key)
    }

    fn flush(&self) -> StoreResult<()> {
        match self.lock_log()?.as_mut() {
            Some(log) => log.flush(),
            None => Ok(()),
        }
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.lock_log()?;
        if let Some(mut log) = guard.take() {
            log.flush()?;
            info!(path = %self.path.display(), "file store closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBucketStore")
            .field("path", &self.path)
            .field("record_count", &self.index.total_records().unwrap_or_default())
            .finish()
    }
}
