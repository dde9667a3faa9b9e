use oc_types::Bucket;

use crate::error::{StoreError, StoreResult};

/// Bucketed key-value store.
///
/// All implementations must satisfy these invariants:
/// - Keys are unique within a bucket; buckets never share keys.
/// - A reader observes either the previous or the new bytes of a key, never
///   a partially written value.
/// - The store never interprets record contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait BucketStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<()>;

    /// Write `value` under `key` only if the key is free.
    ///
    /// Returns `false` without writing if the key is already taken. The check
    /// and the write are atomic with respect to other writers.
    fn insert_new(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<bool>;

    /// Read the value stored under `key`.
    ///
    /// Fails with [`StoreError::NotFound`] if the key is absent.
    fn get(&self, bucket: Bucket, key: u64) -> StoreResult<Vec<u8>>;

    /// Delete `key`. Returns `true` if the key existed.
    fn delete(&self, bucket: Bucket, key: u64) -> StoreResult<bool>;

    /// Every `(key, value)` pair in the bucket, in ascending key order.
    fn entries(&self, bucket: Bucket) -> StoreResult<Vec<(u64, Vec<u8>)>>;

    /// Every key in the bucket, ascending.
    fn keys(&self, bucket: Bucket) -> StoreResult<Vec<u64>> {
        Ok(self.entries(bucket)?.into_iter().map(|(k, _)| k).collect())
    }

    /// Every value in the bucket.
    fn values(&self, bucket: Bucket) -> StoreResult<Vec<Vec<u8>>> {
        Ok(self.entries(bucket)?.into_iter().map(|(_, v)| v).collect())
    }

    /// Check whether a key is present.
    fn contains(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
        match self.get(bucket, key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Push buffered writes to durable storage.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Flush and stop accepting writes.
    fn close(&self) -> StoreResult<()> {
        self.flush()
    }
}
