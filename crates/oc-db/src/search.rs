//! Name and parent-scoped lookup.
//!
//! Every lookup is a linear scan of one bucket with exact, case-sensitive
//! name comparison. There is no secondary index; buckets are expected to stay
//! small.

use oc_types::{ActorKind, BucketItem, City, Company, Country, Named, Oversight, Region, State};

use crate::actor::AnyActor;
use crate::database::Database;
use crate::error::{DbError, DbResult};

/// Whether `record` carries `name` and sits under `parent`.
///
/// With no parent given, any parent matches.
fn is_match<T: Named>(record: &T, name: &str, parent: Option<&str>) -> bool {
    record.name() == name && parent.map_or(true, |p| record.parent_name() == Some(p))
}

impl Database {
    /// Every record of type `T` named exactly `name`. Empty if none match.
    pub fn search_by_name<T: BucketItem + Named>(&self, name: &str) -> DbResult<Vec<T>> {
        Ok(self
            .retrieve_all::<T>()?
            .into_iter()
            .filter(|r| r.name() == name)
            .collect())
    }

    /// The first record of type `T` named `name` under the parent named
    /// `parent`.
    ///
    /// (name, parent) pairs are assumed unique; when they are not, the record
    /// with the lowest identity wins.
    pub fn retrieve_by_name_and_parent<T: BucketItem + Named>(
        &self,
        name: &str,
        parent: &str,
    ) -> DbResult<T> {
        self.find_first(name, Some(parent))
    }

    /// The first record of type `T` named `name`, whatever its parent.
    pub fn retrieve_by_name<T: BucketItem + Named>(&self, name: &str) -> DbResult<T> {
        self.find_first(name, None)
    }

    fn find_first<T: BucketItem + Named>(&self, name: &str, parent: Option<&str>) -> DbResult<T> {
        self.retrieve_all::<T>()?
            .into_iter()
            .find(|r| is_match(r, name, parent))
            .ok_or_else(|| DbError::NameNotFound {
                bucket: T::BUCKET,
                name: name.to_string(),
                parent: parent.map(str::to_string),
            })
    }

    /// Every actor of the tagged kind named exactly `name`.
    pub fn search_actors(&self, kind: &str, name: &str) -> DbResult<Vec<AnyActor>> {
        fn wrap<T: Into<AnyActor>>(records: Vec<T>) -> Vec<AnyActor> {
            records.into_iter().map(Into::into).collect()
        }
        Ok(match kind.parse::<ActorKind>()? {
            ActorKind::Company => wrap(self.search_by_name::<Company>(name)?),
            ActorKind::City => wrap(self.search_by_name::<City>(name)?),
            ActorKind::State => wrap(self.search_by_name::<State>(name)?),
            ActorKind::Region => wrap(self.search_by_name::<Region>(name)?),
            ActorKind::Country => wrap(self.search_by_name::<Country>(name)?),
            ActorKind::Oversight => wrap(self.search_by_name::<Oversight>(name)?),
        })
    }

    /// The actor of the tagged kind named `name` under `parent`.
    ///
    /// `parent` is ignored for kinds that have no parent (country, oversight).
    pub fn resolve_actor_by_name(
        &self,
        kind: &str,
        name: &str,
        parent: Option<&str>,
    ) -> DbResult<AnyActor> {
        let kind: ActorKind = kind.parse()?;
        let parent = kind.parent_kind().and(parent);
        Ok(match kind {
            ActorKind::Company => self.find_first::<Company>(name, parent)?.into(),
            ActorKind::City => self.find_first::<City>(name, parent)?.into(),
            ActorKind::State => self.find_first::<State>(name, parent)?.into(),
            ActorKind::Region => self.find_first::<Region>(name, parent)?.into(),
            ActorKind::Country => self.find_first::<Country>(name, parent)?.into(),
            ActorKind::Oversight => self.find_first::<Oversight>(name, parent)?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use oc_types::{Asset, Bucket};

    fn seeded() -> Database {
        let db = Database::in_memory();
        for (city, state) in [
            ("Springfield", "Illinois"),
            ("Springfield", "Missouri"),
            ("springfield", "Oregon"),
            ("Shelbyville", "Illinois"),
            ("Springfield", "Illinois"),
        ] {
            db.save(&mut City::new(city, state)).unwrap();
        }
        db.save(&mut Country::new("USA")).unwrap();
        db.save(&mut Region::new("Midwest", "USA")).unwrap();
        db
    }

    #[test]
    fn search_returns_all_and_only_exact_matches() {
        let db = seeded();
        let hits = db.search_by_name::<City>("Springfield").unwrap();
        let ids: Vec<u64> = hits.iter().map(|c| c.index).collect();
        assert_eq!(ids, vec![1, 2, 5]);
        assert!(hits.iter().all(|c| c.name == "Springfield"));
    }

    #[test]
    fn search_is_case_sensitive() {
        let db = seeded();
        let hits = db.search_by_name::<City>("springfield").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].state, "Oregon");
    }

    #[test]
    fn search_with_no_match_is_empty_not_error() {
        let db = seeded();
        assert!(db.search_by_name::<City>("Ogdenville").unwrap().is_empty());
        assert!(db.search_by_name::<Company>("Acme").unwrap().is_empty());
    }

    #[test]
    fn search_works_for_non_actor_named_records() {
        let db = Database::in_memory();
        db.save(&mut Asset::new("Solar Farm", ActorKind::City, 1)).unwrap();
        assert_eq!(db.search_by_name::<Asset>("Solar Farm").unwrap().len(), 1);
    }

    #[test]
    fn parent_scoping_disambiguates() {
        let db = seeded();
        let mo = db
            .retrieve_by_name_and_parent::<City>("Springfield", "Missouri")
            .unwrap();
        assert_eq!(mo.index, 2);
    }

    #[test]
    fn duplicate_name_and_parent_returns_first() {
        let db = seeded();
        let il = db
            .retrieve_by_name_and_parent::<City>("Springfield", "Illinois")
            .unwrap();
        assert_eq!(il.index, 1);
    }

    #[test]
    fn missing_name_and_parent_is_name_not_found() {
        let db = seeded();
        let err = db
            .retrieve_by_name_and_parent::<City>("Springfield", "Ohio")
            .unwrap_err();
        match err {
            DbError::NameNotFound {
                bucket,
                name,
                parent,
            } => {
                assert_eq!(bucket, Bucket::City);
                assert_eq!(name, "Springfield");
                assert_eq!(parent.as_deref(), Some("Ohio"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn retrieve_by_name_ignores_parent() {
        let db = seeded();
        assert_eq!(db.retrieve_by_name::<City>("Shelbyville").unwrap().index, 4);
        assert!(db.retrieve_by_name::<Country>("Canada").is_err());
    }

    #[test]
    fn search_actors_by_tag() {
        let db = seeded();
        let hits = db.search_actors("city", "Springfield").unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|a| a.kind() == ActorKind::City));
        assert!(matches!(
            db.search_actors("asset", "Springfield"),
            Err(DbError::UnknownActorKind(_))
        ));
    }

    #[test]
    fn resolve_actor_by_name_uses_parent_where_it_exists() {
        let db = seeded();
        let city = db
            .resolve_actor_by_name("city", "Springfield", Some("Missouri"))
            .unwrap();
        assert_eq!(city.actor_id(), 2);

        let region = db
            .resolve_actor_by_name("region", "Midwest", Some("USA"))
            .unwrap();
        assert_eq!(region.parent_name(), Some("USA"));

        // Countries have no parent, so a stray parent name is ignored.
        let country = db
            .resolve_actor_by_name("country", "USA", Some("Earth"))
            .unwrap();
        assert_eq!(country.actor_id(), 1);
    }

    #[test]
    fn scans_see_saves_made_after_them() {
        let db = seeded();
        assert!(db.search_by_name::<State>("Illinois").unwrap().is_empty());
        db.save(&mut State::new("Illinois", "Midwest")).unwrap();
        assert_eq!(db.search_by_name::<State>("Illinois").unwrap().len(), 1);
    }
}
