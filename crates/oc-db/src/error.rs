use oc_store::StoreError;
use oc_types::{Bucket, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{bucket}/{id} not found")]
    NotFound { bucket: Bucket, id: u64 },

    #[error("no {bucket} named {name:?} (parent: {parent:?})")]
    NameNotFound {
        bucket: Bucket,
        name: String,
        parent: Option<String>,
    },

    #[error("cannot decode {bucket}/{id}: {reason}")]
    Deserialization {
        bucket: Bucket,
        id: u64,
        reason: String,
    },

    #[error("cannot encode {bucket} record: {reason}")]
    Serialization { bucket: Bucket, reason: String },

    #[error("unknown actor kind: {0}")]
    UnknownActorKind(String),

    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("identity {id} in {bucket} was claimed concurrently")]
    ConcurrentIdConflict { bucket: Bucket, id: u64 },

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("invalid credentials for {username}")]
    InvalidCredentials { username: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("bucket lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DbError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { bucket, key } => Self::NotFound { bucket, id: key },
            other => Self::Store(other),
        }
    }
}

impl From<TypeError> for DbError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::UnknownActorKind(tag) => Self::UnknownActorKind(tag),
            TypeError::UnknownBucket(name) => Self::UnknownBucket(name),
            TypeError::NonFinite { bucket, field } => Self::Serialization {
                bucket,
                reason: format!("{field} must be a finite number"),
            },
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
