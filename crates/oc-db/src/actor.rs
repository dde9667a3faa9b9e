//! The actor capability set and type-tag dispatch.
//!
//! Every organizational kind (company, city, state, region, country,
//! oversight) implements [`Actor`] through its [`ActorRecord`] fields.
//! [`AnyActor`] erases the concrete kind so that a caller holding only a type
//! tag and an identity can fetch, inspect and mutate an actor without
//! branching on its kind again.

use oc_types::{
    ActorKind, ActorRecord, BucketItem, City, Company, Country, Named, Oversight, Pledge, Region,
    State,
};
use serde::Serialize;
use tracing::debug;

use crate::database::Database;
use crate::error::DbResult;

/// Operations shared by every organizational entity kind.
///
/// Mutating operations persist immediately and report store failures.
pub trait Actor: Send + Sync {
    /// The actor's own identity.
    fn actor_id(&self) -> u64;

    fn kind(&self) -> ActorKind;

    /// Resolve the stored pledge IDs into full pledge records, in attach order.
    fn get_pledges(&self, db: &Database) -> DbResult<Vec<Pledge>>;

    /// Append pledge IDs to the actor's list and save the actor.
    ///
    /// On error the actor is left as it was.
    fn add_pledges(&mut self, db: &Database, ids: &[u64]) -> DbResult<()>;

    /// Replace the MRV methodology tag and save the actor.
    ///
    /// On error the actor is left as it was.
    fn update_mrv(&mut self, db: &Database, mrv: &str) -> DbResult<()>;
}

impl<T: ActorRecord> Actor for T {
    fn actor_id(&self) -> u64 {
        self.id()
    }

    fn kind(&self) -> ActorKind {
        T::KIND
    }

    fn get_pledges(&self, db: &Database) -> DbResult<Vec<Pledge>> {
        db.retrieve_pledges(self.pledge_ids())
    }

    fn add_pledges(&mut self, db: &Database, ids: &[u64]) -> DbResult<()> {
        let mut next = self.clone();
        next.pledge_ids_mut().extend_from_slice(ids);
        db.save(&mut next)?;
        *self = next;
        debug!(kind = %T::KIND, id = self.id(), added = ids.len(), "pledges attached");
        Ok(())
    }

    fn update_mrv(&mut self, db: &Database, mrv: &str) -> DbResult<()> {
        let mut next = self.clone();
        next.set_mrv(mrv.to_string());
        db.save(&mut next)?;
        *self = next;
        debug!(kind = %T::KIND, id = self.id(), mrv, "MRV updated");
        Ok(())
    }
}

/// An actor of any kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum AnyActor {
    Company(Company),
    City(City),
    State(State),
    Region(Region),
    Country(Country),
    Oversight(Oversight),
}

/// Apply `$body` to the concrete record inside an [`AnyActor`].
macro_rules! with_actor {
    ($actor:expr, $inner:ident => $body:expr) => {
        match $actor {
            AnyActor::Company($inner) => $body,
            AnyActor::City($inner) => $body,
            AnyActor::State($inner) => $body,
            AnyActor::Region($inner) => $body,
            AnyActor::Country($inner) => $body,
            AnyActor::Oversight($inner) => $body,
        }
    };
}

impl AnyActor {
    /// An unsaved actor of `kind`. `parent` is ignored for kinds without one.
    pub fn new(kind: ActorKind, name: impl Into<String>, parent: Option<&str>) -> Self {
        let parent = parent.unwrap_or_default();
        match kind {
            ActorKind::Company => Company::new(name, parent).into(),
            ActorKind::City => City::new(name, parent).into(),
            ActorKind::State => State::new(name, parent).into(),
            ActorKind::Region => Region::new(name, parent).into(),
            ActorKind::Country => Country::new(name).into(),
            ActorKind::Oversight => Oversight::new(name).into(),
        }
    }

    pub fn name(&self) -> &str {
        with_actor!(self, a => a.name())
    }

    /// Name of the parent entity, for kinds that have one.
    pub fn parent_name(&self) -> Option<&str> {
        with_actor!(self, a => a.parent_name())
    }

    pub fn mrv(&self) -> &str {
        with_actor!(self, a => a.mrv())
    }

    pub fn pledge_ids(&self) -> &[u64] {
        with_actor!(self, a => a.pledge_ids())
    }
}

impl Actor for AnyActor {
    fn actor_id(&self) -> u64 {
        with_actor!(self, a => a.actor_id())
    }

    fn kind(&self) -> ActorKind {
        with_actor!(self, a => Actor::kind(a))
    }

    fn get_pledges(&self, db: &Database) -> DbResult<Vec<Pledge>> {
        with_actor!(self, a => a.get_pledges(db))
    }

    fn add_pledges(&mut self, db: &Database, ids: &[u64]) -> DbResult<()> {
        with_actor!(self, a => a.add_pledges(db, ids))
    }

    fn update_mrv(&mut self, db: &Database, mrv: &str) -> DbResult<()> {
        with_actor!(self, a => a.update_mrv(db, mrv))
    }
}

macro_rules! any_actor_from {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for AnyActor {
                fn from(record: $ty) -> Self {
                    AnyActor::$ty(record)
                }
            }
        )*
    };
}

any_actor_from!(Company, City, State, Region, Country, Oversight);

impl Database {
    /// Fetch the actor behind a type tag and identity.
    ///
    /// Fails with `UnknownActorKind` for a tag outside the actor set; a failed
    /// lookup is returned as-is.
    pub fn resolve_actor(&self, kind: &str, id: u64) -> DbResult<AnyActor> {
        self.retrieve_actor(kind.parse()?, id)
    }

    /// Fetch the actor of a known kind by identity.
    pub fn retrieve_actor(&self, kind: ActorKind, id: u64) -> DbResult<AnyActor> {
        Ok(match kind {
            ActorKind::Company => self.retrieve::<Company>(id)?.into(),
            ActorKind::City => self.retrieve::<City>(id)?.into(),
            ActorKind::State => self.retrieve::<State>(id)?.into(),
            ActorKind::Region => self.retrieve::<Region>(id)?.into(),
            ActorKind::Country => self.retrieve::<Country>(id)?.into(),
            ActorKind::Oversight => self.retrieve::<Oversight>(id)?.into(),
        })
    }

    /// Persist an actor of any kind. See [`Database::save`].
    pub fn save_actor(&self, actor: &mut AnyActor) -> DbResult<u64> {
        with_actor!(actor, a => self.save(a))
    }

    /// Every actor of one kind.
    pub fn retrieve_all_actors(&self, kind: ActorKind) -> DbResult<Vec<AnyActor>> {
        fn wrap<T: Into<AnyActor>>(records: Vec<T>) -> Vec<AnyActor> {
            records.into_iter().map(Into::into).collect()
        }
        Ok(match kind {
            ActorKind::Company => wrap(self.retrieve_all::<Company>()?),
            ActorKind::City => wrap(self.retrieve_all::<City>()?),
            ActorKind::State => wrap(self.retrieve_all::<State>()?),
            ActorKind::Region => wrap(self.retrieve_all::<Region>()?),
            ActorKind::Country => wrap(self.retrieve_all::<Country>()?),
            ActorKind::Oversight => wrap(self.retrieve_all::<Oversight>()?),
        })
    }

    /// Load the pledges with the given IDs, in the given order.
    pub fn retrieve_pledges(&self, ids: &[u64]) -> DbResult<Vec<Pledge>> {
        ids.iter().map(|id| self.retrieve::<Pledge>(*id)).collect()
    }

    /// Save a new pledge on behalf of `actor` and attach it.
    ///
    /// The pledge is attributed to the actor before it is saved. Returns the
    /// saved pledge with its assigned identity.
    pub fn add_pledge(&self, actor: &mut dyn Actor, mut pledge: Pledge) -> DbResult<Pledge> {
        pledge.actor_kind = actor.kind();
        pledge.actor_id = actor.actor_id();
        let id = self.save(&mut pledge)?;
        actor.add_pledges(self, &[id])?;
        Ok(pledge)
    }
}
