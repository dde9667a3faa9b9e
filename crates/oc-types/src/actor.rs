//! Organizational entity records: the six actor kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::item::{ensure_finite, ActorRecord, BucketItem, Named};
use crate::kind::{ActorKind, Bucket};

/// A physical site attached to a company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub nation_state_id: u64,
    pub regional_state_id: u64,
}

/// A company, scoped by the country it is registered in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub index: u64,
    pub name: String,
    pub country: String,
    pub description: String,
    pub locations: Vec<Location>,
    pub mrv: String,
    pub pledges: Vec<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Company {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            ..Self::default()
        }
    }
}

/// A country. Top of the geographic hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    pub index: u64,
    pub name: String,
    pub continent: String,
    pub iso: String,
    pub population: u64,
    pub mrv: String,
    pub pledges: Vec<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A region within a country.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub index: u64,
    pub name: String,
    pub country: String,
    pub area: f64,
    pub population: u64,
    pub mrv: String,
    pub pledges: Vec<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Region {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            ..Self::default()
        }
    }
}

/// A state within a region.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub index: u64,
    pub name: String,
    pub region: String,
    pub area: f64,
    pub population: u64,
    pub mrv: String,
    pub pledges: Vec<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl State {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            ..Self::default()
        }
    }
}

/// A city within a state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct City {
    pub index: u64,
    pub name: String,
    pub state: String,
    pub area: f64,
    pub population: u64,
    pub mrv: String,
    pub pledges: Vec<u64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl City {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            ..Self::default()
        }
    }
}

/// An oversight body (regulator, registry, verifier).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oversight {
    pub index: u64,
    pub name: String,
    pub org_type: String,
    pub scope: String,
    pub description: String,
    pub mrv: String,
    pub pledges: Vec<u64>,
}

impl Oversight {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

// Identity, naming and actor-field plumbing is the same for every kind; only
// the bucket, the parent field, the presence of a timestamp and the float
// fields differ.
macro_rules! actor_record {
    (@item $ty:ident, $kind:ident $(, $stamped:ident)?; $($float:ident),*) => {
        impl BucketItem for $ty {
            const BUCKET: Bucket = Bucket::$kind;
            fn id(&self) -> u64 {
                self.index
            }
            fn set_id(&mut self, id: u64) {
                self.index = id;
            }
            $(actor_record!(@touch $stamped);)?
            fn validate(&self) -> Result<(), TypeError> {
                $(ensure_finite(Self::BUCKET, stringify!($float), self.$float)?;)*
                Ok(())
            }
        }
    };
    (@touch stamped) => {
        fn touch(&mut self, now: DateTime<Utc>) {
            self.last_updated = Some(now);
        }
    };
    (@named $ty:ident) => {
        impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
    (@actor $ty:ident, $kind:ident) => {
        impl ActorRecord for $ty {
            const KIND: ActorKind = ActorKind::$kind;
            fn mrv(&self) -> &str {
                &self.mrv
            }
            fn set_mrv(&mut self, mrv: String) {
                self.mrv = mrv;
            }
            fn pledge_ids(&self) -> &[u64] {
                &self.pledges
            }
            fn pledge_ids_mut(&mut self) -> &mut Vec<u64> {
                &mut self.pledges
            }
        }
    };
    ($ty:ident, $kind:ident, parent: $parent:ident, stamped $(, finite: $($float:ident),+)?) => {
        actor_record!(@item $ty, $kind, stamped; $($($float),+)?);
        impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn parent_name(&self) -> Option<&str> {
                Some(&self.$parent)
            }
        }
        actor_record!(@actor $ty, $kind);
    };
    ($ty:ident, $kind:ident, stamped) => {
        actor_record!(@item $ty, $kind, stamped;);
        actor_record!(@named $ty);
        actor_record!(@actor $ty, $kind);
    };
    ($ty:ident, $kind:ident) => {
        actor_record!(@item $ty, $kind;);
        actor_record!(@named $ty);
        actor_record!(@actor $ty, $kind);
    };
}

actor_record!(Company, Company, parent: country, stamped);
actor_record!(City, City, parent: state, stamped, finite: area);
actor_record!(State, State, parent: region, stamped, finite: area);
actor_record!(Region, Region, parent: country, stamped, finite: area);
actor_record!(Country, Country, stamped);
actor_record!(Oversight, Oversight);
