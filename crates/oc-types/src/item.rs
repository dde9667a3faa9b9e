//! Traits that connect records to the store and to the actor layer.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TypeError;
use crate::kind::{ActorKind, Bucket};

/// A record that lives in exactly one bucket under an integer identity.
///
/// An identity of `0` means the record has never been saved; the persistence
/// layer assigns the next free identity on first save. `set_id` exists only
/// for that assignment.
pub trait BucketItem: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The bucket records of this type are stored in.
    const BUCKET: Bucket;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    /// Refresh the last-updated stamp before a save.
    ///
    /// Kinds without a stamp keep the default no-op.
    fn touch(&mut self, _now: DateTime<Utc>) {}

    /// Reject field values the stored encoding cannot carry back.
    ///
    /// JSON has no NaN or infinity, so a float field holding one would be
    /// written as `null` and the record could never be read again.
    fn validate(&self) -> Result<(), TypeError> {
        Ok(())
    }
}

pub(crate) fn ensure_finite(
    bucket: Bucket,
    field: &'static str,
    value: f64,
) -> Result<(), TypeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TypeError::NonFinite { bucket, field })
    }
}

/// A record that can be found by its human-readable name.
pub trait Named {
    fn name(&self) -> &str;

    /// Name of the parent entity (city -> state, state -> region, ...).
    ///
    /// This is a weak, name-based reference; nothing checks that the parent
    /// exists.
    fn parent_name(&self) -> Option<&str> {
        None
    }
}

/// Data side of the actor capability set: the fields every organizational
/// entity kind shares.
pub trait ActorRecord: BucketItem + Named {
    const KIND: ActorKind;

    /// Measurement/reporting/verification methodology tag.
    fn mrv(&self) -> &str;

    fn set_mrv(&mut self, mrv: String);

    /// IDs of the pledges attributed to this actor, in attach order.
    fn pledge_ids(&self) -> &[u64];

    fn pledge_ids_mut(&mut self) -> &mut Vec<u64>;
}
