//! Entity persistence for OpenClimate.
//!
//! [`Database`] binds the typed records of `oc-types` to a
//! [`BucketStore`](oc_store::BucketStore): it assigns identities, encodes
//! records as JSON, and layers lookup by name, actor dispatch by type tag,
//! and user accounts on top.
//!
//! # Identity Assignment
//!
//! A record saved with identity `0` receives `1 + max(existing identities)`
//! in its bucket. Assignment holds a per-bucket lock across the read of the
//! current maximum and the write, and the write itself is a put-if-absent,
//! so two saves can never share an identity: a collision surfaces as
//! [`DbError::ConcurrentIdConflict`] instead of an overwrite.
//!
//! # Actors
//!
//! The six organizational kinds share the [`Actor`] capability set (pledges
//! and MRV). [`Database::resolve_actor`] turns a type tag and an identity
//! into an [`AnyActor`], failing with [`DbError::UnknownActorKind`] for a
//! tag outside the set.
//!
//! ```no_run
//! use oc_db::{Actor, Database};
//! use oc_types::City;
//!
//! # fn main() -> oc_db::DbResult<()> {
//! let db = Database::in_memory();
//! db.save(&mut City::new("Springfield", "Illinois"))?;
//!
//! let mut city = db.resolve_actor("city", 1)?;
//! city.update_mrv(&db, "GHG-Protocol")?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod database;
pub mod error;
pub mod search;
pub mod users;

pub use actor::{Actor, AnyActor};
pub use config::DbConfig;
pub use database::Database;
pub use error::{DbError, DbResult};
pub use users::{UserUpdate, PWHASH_LEN};
