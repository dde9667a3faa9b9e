use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::item::{ensure_finite, BucketItem};
use crate::kind::{ActorKind, Bucket};

/// A commitment attributable to exactly one actor.
///
/// The pledge bucket owns the record; actors only hold its ID.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: u64,
    /// Free-form category, e.g. "emissions-reduction" or "renewables".
    pub pledge_type: String,
    pub base_year: i32,
    pub target_year: i32,
    /// Target value in the pledge's own unit (percent reduction, MW, ...).
    pub goal: f64,
    /// Whether the pledge is backed by regulation rather than voluntary.
    pub regulatory: bool,
    pub actor_kind: ActorKind,
    pub actor_id: u64,
}

impl Pledge {
    pub fn new(actor_kind: ActorKind, actor_id: u64, pledge_type: impl Into<String>) -> Self {
        Self {
            id: 0,
            pledge_type: pledge_type.into(),
            base_year: 0,
            target_year: 0,
            goal: 0.0,
            regulatory: false,
            actor_kind,
            actor_id,
        }
    }

    /// Set the baseline and target years.
    pub fn years(mut self, base_year: i32, target_year: i32) -> Self {
        self.base_year = base_year;
        self.target_year = target_year;
        self
    }

    pub fn goal(mut self, goal: f64) -> Self {
        self.goal = goal;
        self
    }
}

impl BucketItem for Pledge {
    const BUCKET: Bucket = Bucket::Pledge;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), TypeError> {
        ensure_finite(Self::BUCKET, "goal", self.goal)
    }
}
