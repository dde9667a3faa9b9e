//! Bucketed key-value storage for OpenClimate.
//!
//! The store is partitioned into named [`Bucket`](oc_types::Bucket)s, one per
//! entity kind. Within a bucket a record is addressed by a non-negative
//! integer key and held as opaque bytes: the store never inspects contents.
//!
//! # Storage Backends
//!
//! All backends implement the [`BucketStore`] trait:
//!
//! - [`InMemoryBucketStore`] -- map-based store for tests and embedding
//! - [`FileBucketStore`] -- append-only, CRC-framed operation log replayed
//!   into an in-memory index on open
//!
//! # Design Rules
//!
//! 1. A write replaces a whole value; readers never observe a torn record.
//! 2. `insert_new` is an atomic put-if-absent; the identity layer relies on it
//!    to detect colliding identity assignment.
//! 3. Log first, then index: the file store appends before it applies.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod log;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileBucketStore, FileStoreConfig};
pub use log::{LogRecord, SyncMode};
pub use memory::InMemoryBucketStore;
pub use traits::BucketStore;
