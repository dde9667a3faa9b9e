use oc_types::Bucket;

/// Errors from bucketed store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record is stored under the key.
    #[error("{bucket}/{key} not found")]
    NotFound { bucket: Bucket, key: u64 },

    /// Encoding or decoding of a log record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A failed append left bytes in the log that could not be removed.
    #[error("log writer is unusable after a failed append")]
    LogBroken,

    /// The store has been closed and no longer accepts writes.
    #[error("store is closed")]
    Closed,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
