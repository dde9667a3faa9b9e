//! Entity records for OpenClimate.
//!
//! Every record persists in exactly one [`Bucket`] under a store-assigned
//! integer identity. The six organizational kinds (company, city, state,
//! region, country, oversight) additionally implement [`ActorRecord`], the
//! data half of the actor capability set; the behaviour half lives in
//! `oc-db`, next to the store handle it needs.
//!
//! # Key Types
//!
//! - [`Bucket`] -- the fixed set of store partitions
//! - [`ActorKind`] -- the closed set of actor type tags
//! - [`BucketItem`] -- identity + bucket binding for any record
//! - [`Named`] -- name and weak parent-name reference used by search
//! - [`Company`], [`City`], [`State`], [`Region`], [`Country`], [`Oversight`]
//! - [`Pledge`], [`User`], [`ConnectRequest`], [`Asset`]

pub mod actor;
pub mod asset;
pub mod error;
pub mod item;
pub mod kind;
pub mod pledge;
pub mod user;

pub use actor::{City, Company, Country, Location, Oversight, Region, State};
pub use asset::Asset;
pub use error::TypeError;
pub use item::{ActorRecord, BucketItem, Named};
pub use kind::{ActorKind, Bucket};
pub use pledge::Pledge;
pub use user::{ConnectRequest, EthWallet, User};
