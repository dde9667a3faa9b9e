use serde::{Deserialize, Serialize};

use crate::actor::Location;
use crate::item::{BucketItem, Named};
use crate::kind::{ActorKind, Bucket};

/// A physical asset (plant, facility, installation) owned by an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub index: u64,
    pub name: String,
    pub asset_type: String,
    pub actor_kind: ActorKind,
    pub actor_id: u64,
    pub location: Location,
}

impl Asset {
    pub fn new(name: impl Into<String>, actor_kind: ActorKind, actor_id: u64) -> Self {
        Self {
            index: 0,
            name: name.into(),
            asset_type: String::new(),
            actor_kind,
            actor_id,
            location: Location::default(),
        }
    }
}

impl BucketItem for Asset {
    const BUCKET: Bucket = Bucket::Asset;

    fn id(&self) -> u64 {
        self.index
    }

    fn set_id(&mut self, id: u64) {
        self.index = id;
    }
}

impl Named for Asset {
    fn name(&self) -> &str {
        &self.name
    }
}
