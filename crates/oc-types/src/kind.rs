use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A named partition of the store. One bucket per entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Company,
    City,
    State,
    Region,
    Country,
    Oversight,
    Pledge,
    User,
    Request,
    Asset,
}

impl Bucket {
    /// Every bucket, in declaration order.
    pub const ALL: [Bucket; 10] = [
        Bucket::Company,
        Bucket::City,
        Bucket::State,
        Bucket::Region,
        Bucket::Country,
        Bucket::Oversight,
        Bucket::Pledge,
        Bucket::User,
        Bucket::Request,
        Bucket::Asset,
    ];

    /// The bucket's on-disk name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::City => "city",
            Self::State => "state",
            Self::Region => "region",
            Self::Country => "country",
            Self::Oversight => "oversight",
            Self::Pledge => "pledge",
            Self::User => "user",
            Self::Request => "request",
            Self::Asset => "asset",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TypeError::UnknownBucket(s.to_string()))
    }
}

/// The organizational entity kinds that carry the actor capability set.
///
/// The set is closed: dispatch over actor kinds is an exhaustive `match`, so
/// adding a kind here is a compile error everywhere the dispatch table lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Company,
    City,
    State,
    Region,
    Country,
    Oversight,
}

impl ActorKind {
    pub const ALL: [ActorKind; 6] = [
        ActorKind::Company,
        ActorKind::City,
        ActorKind::State,
        ActorKind::Region,
        ActorKind::Country,
        ActorKind::Oversight,
    ];

    /// The type tag callers use to name this kind.
    pub const fn as_str(&self) -> &'static str {
        self.bucket().as_str()
    }

    /// The bucket records of this kind are stored in.
    pub const fn bucket(&self) -> Bucket {
        match self {
            Self::Company => Bucket::Company,
            Self::City => Bucket::City,
            Self::State => Bucket::State,
            Self::Region => Bucket::Region,
            Self::Country => Bucket::Country,
            Self::Oversight => Bucket::Oversight,
        }
    }

    /// The kind a record of this kind names as its parent, if any.
    ///
    /// City -> State -> Region -> Country; companies are scoped by country.
    pub const fn parent_kind(&self) -> Option<ActorKind> {
        match self {
            Self::City => Some(Self::State),
            Self::State => Some(Self::Region),
            Self::Region => Some(Self::Country),
            Self::Company => Some(Self::Country),
            Self::Country | Self::Oversight => None,
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TypeError::UnknownActorKind(s.to_string()))
    }
}

impl From<ActorKind> for Bucket {
    fn from(kind: ActorKind) -> Self {
        kind.bucket()
    }
}
