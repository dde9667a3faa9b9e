use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use oc_store::{BucketStore, FileBucketStore, InMemoryBucketStore};
use oc_types::{Bucket, BucketItem};
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};

/// One mutex per bucket, each guarding that bucket's identity high-water mark.
///
/// Holding a bucket's guard makes read-max-then-write identity assignment
/// atomic for every save that goes through the same [`Database`].
struct BucketLocks {
    slots: [Mutex<u64>; Bucket::ALL.len()],
}

impl BucketLocks {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Mutex::new(0)),
        }
    }

    fn lock(&self, bucket: Bucket) -> DbResult<MutexGuard<'_, u64>> {
        self.slots[bucket as usize]
            .lock()
            .map_err(|e| DbError::LockPoisoned(format!("{bucket}: {e}")))
    }
}

/// Typed entity persistence over a [`BucketStore`].
///
/// Maps records to their bucket, assigns identities on first save, and
/// encodes records as JSON. The store handle is passed in explicitly, so the
/// same code runs against the in-memory store in tests and the file store in
/// production.
pub struct Database {
    store: Arc<dyn BucketStore>,
    locks: BucketLocks,
}

impl Database {
    /// Wrap an existing store.
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self {
            store,
            locks: BucketLocks::new(),
        }
    }

    /// A database over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBucketStore::new()))
    }

    /// Open the backend named by `config`.
    pub fn open(config: &DbConfig) -> DbResult<Self> {
        match &config.data_path {
            Some(path) => {
                let store = FileBucketStore::open(path, config.file_store_config())?;
                Ok(Self::new(Arc::new(store)))
            }
            None => {
                info!("opening in-memory database");
                Ok(Self::in_memory())
            }
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn BucketStore {
        self.store.as_ref()
    }

    /// Flush the store and stop accepting writes.
    pub fn close(&self) -> DbResult<()> {
        self.store.close()?;
        Ok(())
    }

    /// Persist `item`, assigning it an identity if it has none.
    ///
    /// A record with identity `0` gets `1 + max(existing identities)` (or 1 in
    /// an empty bucket) and is inserted only if that key is still free; a
    /// record with a non-zero identity overwrites its key in full. Kinds with
    /// a last-updated stamp are stamped first. Records with a float field
    /// that is NaN or infinite are rejected with [`DbError::Serialization`].
    ///
    /// `item` is updated (identity, stamp) only when the write succeeds.
    /// Returns the identity.
    pub fn save<T: BucketItem>(&self, item: &mut T) -> DbResult<u64> {
        self.save_checked(item, |_| Ok(()))
    }

    /// [`save`](Self::save), running `check` first with the bucket lock held
    /// until the write lands.
    ///
    /// `check` sees the record as it will be written. It may read any bucket
    /// but must not save into `T`'s bucket.
    pub(crate) fn save_checked<T, F>(&self, item: &mut T, check: F) -> DbResult<u64>
    where
        T: BucketItem,
        F: FnOnce(&T) -> DbResult<()>,
    {
        item.validate()?;
        let mut high_water = self.locks.lock(T::BUCKET)?;
        check(&*item)?;

        let mut staged = item.clone();
        staged.touch(Utc::now());

        let id = if staged.id() != 0 {
            let id = staged.id();
            self.store.put(T::BUCKET, id, &encode(&staged)?)?;
            debug!(bucket = %T::BUCKET, id, "record updated");
            id
        } else {
            let current_max = self.store.keys(T::BUCKET)?.into_iter().max().unwrap_or(0);
            let id = (*high_water).max(current_max) + 1;
            staged.set_id(id);
            self.insert_assigned(&staged, id)?;
            debug!(bucket = %T::BUCKET, id, "identity assigned");
            id
        };

        *high_water = (*high_water).max(id);
        *item = staged;
        Ok(id)
    }

    fn insert_assigned<T: BucketItem>(&self, item: &T, id: u64) -> DbResult<()> {
        let bytes = encode(item)?;
        if self.store.insert_new(T::BUCKET, id, &bytes)? {
            Ok(())
        } else {
            warn!(bucket = %T::BUCKET, id, "identity already taken by another writer");
            Err(DbError::ConcurrentIdConflict {
                bucket: T::BUCKET,
                id,
            })
        }
    }

    /// Load one record by identity.
    pub fn retrieve<T: BucketItem>(&self, id: u64) -> DbResult<T> {
        let bytes = self.store.get(T::BUCKET, id)?;
        decode(T::BUCKET, id, &bytes)
    }

    /// Load every record in `T`'s bucket, in identity order.
    ///
    /// One undecodable record fails the whole scan.
    pub fn retrieve_all<T: BucketItem>(&self) -> DbResult<Vec<T>> {
        self.store
            .entries(T::BUCKET)?
            .into_iter()
            .map(|(id, bytes)| {
                decode(T::BUCKET, id, &bytes).inspect_err(|e| {
                    warn!(bucket = %T::BUCKET, id, error = %e, "malformed record aborts scan");
                })
            })
            .collect()
    }

    /// Delete a record by identity. Dependent records are left in place.
    pub fn delete<T: BucketItem>(&self, id: u64) -> DbResult<()> {
        self.delete_key(T::BUCKET, id)
    }

    /// Delete a raw bucket key.
    pub fn delete_key(&self, bucket: Bucket, id: u64) -> DbResult<()> {
        if self.store.delete(bucket, id)? {
            debug!(%bucket, id, "record deleted");
            Ok(())
        } else {
            Err(DbError::NotFound { bucket, id })
        }
    }

    /// Number of records in `T`'s bucket.
    pub fn count<T: BucketItem>(&self) -> DbResult<usize> {
        Ok(self.store.keys(T::BUCKET)?.len())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

fn encode<T: BucketItem>(item: &T) -> DbResult<Vec<u8>> {
    serde_json::to_vec(item).map_err(|e| DbError::Serialization {
        bucket: T::BUCKET,
        reason: e.to_string(),
    })
}

fn decode<T: BucketItem>(bucket: Bucket, id: u64, bytes: &[u8]) -> DbResult<T> {
    serde_json::from_slice(bytes).map_err(|e| DbError::Deserialization {
        bucket,
        id,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_store::StoreResult;
    use oc_types::{
        ActorKind, Asset, City, Company, ConnectRequest, Country, EthWallet, Location, Oversight,
        Pledge, Region, State, User,
    };
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // Identity assignment
    // -----------------------------------------------------------------------

    #[test]
    fn first_save_into_empty_bucket_gets_one() {
        let db = Database::in_memory();
        let mut city = City::new("Springfield", "Illinois");
        assert_eq!(db.save(&mut city).unwrap(), 1);
        assert_eq!(city.index, 1);
    }

    #[test]
    fn buckets_number_independently() {
        let db = Database::in_memory();
        let mut city = City::new("Springfield", "Illinois");
        let mut state = State::new("Illinois", "Midwest");
        let mut company = Company::new("Acme", "USA");
        db.save(&mut city).unwrap();
        db.save(&mut state).unwrap();
        db.save(&mut company).unwrap();
        assert_eq!((city.index, state.index, company.index), (1, 1, 1));
    }

    #[test]
    fn resave_overwrites_in_place() {
        let db = Database::in_memory();
        let mut region = Region::new("Midwest", "USA");
        let id = db.save(&mut region).unwrap();

        region.population = 68_000_000;
        assert_eq!(db.save(&mut region).unwrap(), id);

        assert_eq!(db.count::<Region>().unwrap(), 1);
        assert_eq!(db.retrieve::<Region>(id).unwrap().population, 68_000_000);
    }

    #[test]
    fn next_id_follows_current_max() {
        let db = Database::in_memory();
        let mut explicit = Country::new("Atlantis");
        explicit.index = 40;
        db.save(&mut explicit).unwrap();

        let mut next = Country::new("Lemuria");
        assert_eq!(db.save(&mut next).unwrap(), 41);
    }

    #[test]
    fn explicit_id_raises_high_water_mark() {
        let db = Database::in_memory();
        let mut explicit = Country::new("Atlantis");
        explicit.index = 40;
        db.save(&mut explicit).unwrap();
        db.delete::<Country>(40).unwrap();

        let mut next = Country::new("Lemuria");
        assert_eq!(db.save(&mut next).unwrap(), 41);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let db = Database::in_memory();
        for name in ["a", "b", "c"] {
            db.save(&mut Oversight::new(name)).unwrap();
        }
        db.delete::<Oversight>(3).unwrap();
        db.delete::<Oversight>(2).unwrap();

        let mut d = Oversight::new("d");
        assert_eq!(db.save(&mut d).unwrap(), 4);
        assert_eq!(db.retrieve_all::<Oversight>().unwrap().len(), 2);
    }

    #[test]
    fn save_stamps_timestamped_kinds() {
        let db = Database::in_memory();
        let mut company = Company::new("Acme", "USA");
        assert!(company.last_updated.is_none());
        db.save(&mut company).unwrap();
        let first = company.last_updated.expect("stamped on save");

        db.save(&mut company).unwrap();
        assert!(company.last_updated.unwrap() >= first);
        assert_eq!(
            db.retrieve::<Company>(company.index).unwrap().last_updated,
            company.last_updated
        );
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn non_finite_floats_are_rejected_before_write() {
        let db = Database::in_memory();
        let mut pledge = Pledge::new(ActorKind::City, 1, "renewables").goal(f64::INFINITY);
        let err = db.save(&mut pledge).unwrap_err();
        assert!(matches!(
            err,
            DbError::Serialization {
                bucket: Bucket::Pledge,
                ..
            }
        ));
        assert_eq!(pledge.id, 0);

        let mut city = City::new("Springfield", "Illinois");
        city.area = f64::NAN;
        assert!(matches!(
            db.save(&mut city),
            Err(DbError::Serialization {
                bucket: Bucket::City,
                ..
            })
        ));

        assert_eq!(db.count::<Pledge>().unwrap(), 0);
        assert_eq!(db.count::<City>().unwrap(), 0);
    }

    #[test]
    fn rejected_update_keeps_bucket_scannable() {
        let db = Database::in_memory();
        let mut state = State::new("Illinois", "Midwest");
        state.area = 149_997.0;
        db.save(&mut state).unwrap();
        db.save(&mut State::new("Ohio", "Midwest")).unwrap();

        let mut broken = state.clone();
        broken.area = f64::NEG_INFINITY;
        assert!(db.save(&mut broken).is_err());

        let states = db.retrieve_all::<State>().unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].area, 149_997.0);
    }

    proptest! {
        #[test]
        fn sequential_saves_number_one_to_n(n in 1usize..40) {
            let db = Database::in_memory();
            let ids: Vec<u64> = (0..n)
                .map(|i| db.save(&mut Pledge::new(ActorKind::City, 1, format!("p{i}"))).unwrap())
                .collect();
            let expected: Vec<u64> = (1..=n as u64).collect();
            prop_assert_eq!(ids, expected);
        }
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    fn text() -> impl Strategy<Value = String> {
        "\\PC{1,12}"
    }

    fn finite() -> impl Strategy<Value = f64> {
        any::<f64>().prop_filter("finite", |v| v.is_finite())
    }

    fn ids() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(any::<u64>(), 1..4)
    }

    fn actor_kind() -> impl Strategy<Value = ActorKind> {
        prop::sample::select(ActorKind::ALL.to_vec())
    }

    prop_compose! {
        fn location()(
            name in text(),
            latitude in text(),
            longitude in text(),
            nation_state_id in any::<u64>(),
            regional_state_id in any::<u64>(),
        ) -> Location {
            Location { name, latitude, longitude, nation_state_id, regional_state_id }
        }
    }

    prop_compose! {
        fn company()(
            name in text(),
            country in text(),
            description in text(),
            locations in prop::collection::vec(location(), 1..3),
            mrv in text(),
            pledges in ids(),
        ) -> Company {
            Company {
                index: 0,
                name,
                country,
                description,
                locations,
                mrv,
                pledges,
                last_updated: None,
            }
        }
    }

    prop_compose! {
        fn city()(
            name in text(),
            state in text(),
            area in finite(),
            population in any::<u64>(),
            mrv in text(),
            pledges in ids(),
        ) -> City {
            City { index: 0, name, state, area, population, mrv, pledges, last_updated: None }
        }
    }

    prop_compose! {
        fn state()(
            name in text(),
            region in text(),
            area in finite(),
            population in any::<u64>(),
            mrv in text(),
            pledges in ids(),
        ) -> State {
            State { index: 0, name, region, area, population, mrv, pledges, last_updated: None }
        }
    }

    prop_compose! {
        fn region()(
            name in text(),
            country in text(),
            area in finite(),
            population in any::<u64>(),
            mrv in text(),
            pledges in ids(),
        ) -> Region {
            Region { index: 0, name, country, area, population, mrv, pledges, last_updated: None }
        }
    }

    prop_compose! {
        fn country()(
            name in text(),
            continent in text(),
            iso in text(),
            population in any::<u64>(),
            mrv in text(),
            pledges in ids(),
        ) -> Country {
            Country { index: 0, name, continent, iso, population, mrv, pledges, last_updated: None }
        }
    }

    prop_compose! {
        fn oversight()(
            name in text(),
            org_type in text(),
            scope in text(),
            description in text(),
            mrv in text(),
            pledges in ids(),
        ) -> Oversight {
            Oversight { index: 0, name, org_type, scope, description, mrv, pledges }
        }
    }

    prop_compose! {
        fn pledge()(
            pledge_type in text(),
            base_year in any::<i32>(),
            target_year in any::<i32>(),
            goal in finite(),
            regulatory in any::<bool>(),
            actor_kind in actor_kind(),
            actor_id in any::<u64>(),
        ) -> Pledge {
            Pledge {
                id: 0,
                pledge_type,
                base_year,
                target_year,
                goal,
                regulatory,
                actor_kind,
                actor_id,
            }
        }
    }

    prop_compose! {
        fn user()(
            username in text(),
            email in text(),
            pwhash in text(),
            entity_type in text(),
            entity_id in any::<u64>(),
            verified in any::<bool>(),
            admin in any::<bool>(),
            wallet in (text(), text(), text()),
        ) -> User {
            let (encrypted_private_key, public_key, address) = wallet;
            User {
                index: 0,
                username,
                email,
                pwhash,
                entity_type,
                entity_id,
                verified,
                admin,
                ethereum_wallet: EthWallet { encrypted_private_key, public_key, address },
            }
        }
    }

    prop_compose! {
        fn connect_request()(
            user_id in any::<u64>(),
            actor_kind in actor_kind(),
            actor_id in any::<u64>(),
            approved in any::<bool>(),
        ) -> ConnectRequest {
            ConnectRequest { index: 0, user_id, actor_kind, actor_id, approved }
        }
    }

    prop_compose! {
        fn asset()(
            name in text(),
            asset_type in text(),
            actor_kind in actor_kind(),
            actor_id in any::<u64>(),
            location in location(),
        ) -> Asset {
            Asset { index: 0, name, asset_type, actor_kind, actor_id, location }
        }
    }

    /// Save `item`, then read it back both by identity and by bucket scan.
    fn assert_roundtrip<T>(mut item: T) -> Result<(), TestCaseError>
    where
        T: BucketItem + PartialEq + std::fmt::Debug,
    {
        let db = Database::in_memory();
        let id = db.save(&mut item).unwrap();
        prop_assert_eq!(id, 1);
        prop_assert_eq!(&db.retrieve::<T>(id).unwrap(), &item);
        prop_assert_eq!(db.retrieve_all::<T>().unwrap(), vec![item]);
        Ok(())
    }

    proptest! {
        #[test]
        fn company_roundtrips(record in company()) { assert_roundtrip(record)?; }

        #[test]
        fn city_roundtrips(record in city()) { assert_roundtrip(record)?; }

        #[test]
        fn state_roundtrips(record in state()) { assert_roundtrip(record)?; }

        #[test]
        fn region_roundtrips(record in region()) { assert_roundtrip(record)?; }

        #[test]
        fn country_roundtrips(record in country()) { assert_roundtrip(record)?; }

        #[test]
        fn oversight_roundtrips(record in oversight()) { assert_roundtrip(record)?; }

        #[test]
        fn pledge_roundtrips(record in pledge()) { assert_roundtrip(record)?; }

        #[test]
        fn user_roundtrips(record in user()) { assert_roundtrip(record)?; }

        #[test]
        fn connect_request_roundtrips(record in connect_request()) { assert_roundtrip(record)?; }

        #[test]
        fn asset_roundtrips(record in asset()) { assert_roundtrip(record)?; }
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_first_saves_get_distinct_ids() {
        use std::thread;

        for _ in 0..50 {
            let db = Arc::new(Database::in_memory());
            let handles: Vec<_> = ["Springfield", "Shelbyville"]
                .into_iter()
                .map(|name| {
                    let db = Arc::clone(&db);
                    thread::spawn(move || db.save(&mut City::new(name, "Illinois")).unwrap())
                })
                .collect();
            let mut ids: Vec<u64> = handles
                .into_iter()
                .map(|h| h.join().expect("thread should not panic"))
                .collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2]);
        }
    }

    #[test]
    fn many_concurrent_saves_fill_one_to_n() {
        use std::thread;

        let db = Arc::new(Database::in_memory());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let db = Arc::clone(&db);
                thread::spawn(move || db.save(&mut Company::new(format!("c{i}"), "USA")).unwrap())
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }

    /// A store whose key listing is always empty, as seen by a writer that
    /// does not share this process's bucket locks.
    struct StaleKeys(InMemoryBucketStore);

    impl BucketStore for StaleKeys {
        fn put(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<()> {
            self.0.put(bucket, key, value)
        }
        fn insert_new(&self, bucket: Bucket, key: u64, value: &[u8]) -> StoreResult<bool> {
            self.0.insert_new(bucket, key, value)
        }
        fn get(&self, bucket: Bucket, key: u64) -> StoreResult<Vec<u8>> {
            self.0.get(bucket, key)
        }
        fn delete(&self, bucket: Bucket, key: u64) -> StoreResult<bool> {
            self.0.delete(bucket, key)
        }
        fn entries(&self, bucket: Bucket) -> StoreResult<Vec<(u64, Vec<u8>)>> {
            self.0.entries(bucket)
        }
        fn keys(&self, _bucket: Bucket) -> StoreResult<Vec<u64>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn colliding_assignment_is_reported_not_overwritten() {
        let store: Arc<dyn BucketStore> = Arc::new(StaleKeys(InMemoryBucketStore::new()));
        let first = Database::new(Arc::clone(&store));
        let second = Database::new(store);

        let mut a = User {
            username: "alice".into(),
            ..User::default()
        };
        let mut b = User {
            username: "bob".into(),
            ..User::default()
        };
        assert_eq!(first.save(&mut a).unwrap(), 1);

        let err = second.save(&mut b).unwrap_err();
        assert!(matches!(
            err,
            DbError::ConcurrentIdConflict {
                bucket: Bucket::User,
                id: 1
            }
        ));
        assert_eq!(b.index, 0, "failed save leaves the record unsaved");
        assert_eq!(first.retrieve::<User>(1).unwrap().username, "alice");
    }

    // -----------------------------------------------------------------------
    // Retrieval
    // -----------------------------------------------------------------------

    #[test]
    fn retrieve_missing_is_not_found() {
        let db = Database::in_memory();
        let err = db.retrieve::<State>(7).unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound {
                bucket: Bucket::State,
                id: 7
            }
        ));
    }

    #[test]
    fn retrieve_corrupt_is_deserialization_error() {
        let db = Database::in_memory();
        db.store().put(Bucket::City, 1, b"not json").unwrap();
        let err = db.retrieve::<City>(1).unwrap_err();
        assert!(matches!(err, DbError::Deserialization { id: 1, .. }));
    }

    #[test]
    fn retrieve_all_returns_every_record() {
        let db = Database::in_memory();
        for name in ["Springfield", "Shelbyville", "Capital City"] {
            db.save(&mut City::new(name, "Illinois")).unwrap();
        }
        let names: Vec<String> = db
            .retrieve_all::<City>()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Springfield", "Shelbyville", "Capital City"]);
    }

    #[test]
    fn one_malformed_record_aborts_scan() {
        let db = Database::in_memory();
        db.save(&mut City::new("Springfield", "Illinois")).unwrap();
        db.store().put(Bucket::City, 2, b"{\"index\": \"two\"}").unwrap();
        assert!(matches!(
            db.retrieve_all::<City>(),
            Err(DbError::Deserialization { id: 2, .. })
        ));
    }

    #[test]
    fn empty_bucket_scans_to_empty() {
        let db = Database::in_memory();
        assert!(db.retrieve_all::<Region>().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let db = Database::in_memory();
        assert!(matches!(
            db.delete::<User>(1),
            Err(DbError::NotFound { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn file_backed_database_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::at(dir.path().join("oc.log"));
        {
            let db = Database::open(&config).unwrap();
            db.save(&mut Country::new("Kenya")).unwrap();
            db.save(&mut Country::new("Chile")).unwrap();
            db.close().unwrap();
        }

        let db = Database::open(&config).unwrap();
        assert_eq!(db.retrieve::<Country>(2).unwrap().name, "Chile");
        assert_eq!(db.save(&mut Country::new("Nepal")).unwrap(), 3);
    }

    #[test]
    fn closed_database_rejects_saves() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&DbConfig::at(dir.path().join("oc.log"))).unwrap();
        db.close().unwrap();
        let err = db.save(&mut Country::new("Kenya")).unwrap_err();
        assert!(matches!(err, DbError::Store(oc_store::StoreError::Closed)));
    }
}
