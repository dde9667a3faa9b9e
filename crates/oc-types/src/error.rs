use thiserror::Error;

use crate::kind::Bucket;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("unknown actor kind: {0}")]
    UnknownActorKind(String),

    #[error("{bucket}.{field} must be a finite number")]
    NonFinite { bucket: Bucket, field: &'static str },
}
