use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use oc_types::Bucket;

use crate::error::{StoreError, StoreResult};
use crate::traits::BucketStore;

type Buckets = HashMap<Bucket, BTreeMap<u64, Vec<u8>>>;

/// In-memory, map-based bucket store.
///
/// Intended for tests and embedding, and used as the read index of
/// [`FileBucketStore`](crate::FileBucketStore). Every bucket is a `BTreeMap`
/// so scans come back in key order. Values are cloned on read and write, and
/// a write replaces the whole value under the lock, so readers never see a
/// torn record.
pub struct InMemoryBucketStore {
    buckets: RwLock<Buckets>,
}

impl InMemoryBucketStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records in one bucket.
    pub fn len(&self, bucket: Bucket) -> StoreResult<usize> {
        Ok(self.read()?.get(&bucket).map_or(0, BTreeMap::len))
    }

    /// Total number of records across all buckets.
    pub fn total_records(&self) -> StoreResult<usize> {
        Ok(self.read()?.values().map(BTreeMap::len).sum())
    }

    /// Returns `true` if no bucket holds any record.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.total_records()? == 0)
    }

    /// Remove every record from every bucket.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Buckets>> {
        self.buckets
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Buckets>> {
        self.buckets
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for InMemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketStore for InMemoryBucketStore {
    fn put(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<()> {
        self.write()?
            .entry(bucket)
            .or_default()
            .insert(key, value.to_vec());
        Ok(())
    }

    fn insert_new(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<bool> {
        let mut buckets = self.write()?;
        let records = buckets.entry(bucket).or_default();
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, value.to_vec());
        Ok(true)
    }

    fn get(&self, bucket: Bucket, key: u64) -> StoreResult<Vec<u8>> {
        self.read()?
            .get(&bucket)
            .and_then(|records| records.get(&key))
            .cloned()
            .ok_or(StoreError::NotFound { bucket, key })
    }

    fn delete(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
        Ok(self
            .write()?
            .get_mut(&bucket)
            .is_some_and(|records| records.remove(&key).is_some()))
    }

    fn entries(&self, bucket: Bucket) -> StoreResult<Vec<(u64, Vec<u8>)>> {
        Ok(self
            .read()?
            .get(&bucket)
            .map(|records| records.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default())
    }

    fn keys(&self, bucket: Bucket) -> StoreResult<Vec<u64>> {
        Ok(self
            .read()?
            .get(&bucket)
            .map(|records| records.keys().copied().collect())
            .unwrap_or_default())
    }

    fn contains(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
        Ok(self
            .read()?
            .get(&bucket)
            .is_some_and(|records| records.contains_key(&key)))
    }
}

impl std::fmt::Debug for InMemoryBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.total_records().unwrap_or_default();
        f.debug_struct("InMemoryBucketStore")
            .field("record_count", &count)
            .finish()
    }
}
