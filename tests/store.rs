//! Tests for the in-memory geolocation store

use chrono::{DateTime, TimeZone, Utc};
use herdtrack::{
    grouped_latest, AnimalId, Coordinate, FarmId, GeoPoint, GeolocationSource, HerdTrackError,
    MemoryStore, PointId, SpatialClusterer, TimeRange, ZoomProfile,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 12, 30, hour, 0, 0).unwrap()
}

fn fix(id: u64, animal: u64, hour: u32) -> GeoPoint {
    GeoPoint::new(
        PointId(id),
        AnimalId(animal),
        Some(at(hour)),
        Coordinate::new(id as f64 * 10.0, 0.0),
    )
}

fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.register_animal(AnimalId(1), FarmId(1));
    store.register_animal(AnimalId(2), FarmId(1));
    store.register_animal(AnimalId(3), FarmId(2));

    // Ingested out of order on purpose
    store.ingest(fix(3, 1, 12)).unwrap();
    store.ingest(fix(1, 1, 8)).unwrap();
    store.ingest(fix(2, 1, 10)).unwrap();
    store.ingest(fix(4, 2, 9)).unwrap();
    store.ingest(fix(5, 3, 11)).unwrap();
    store
}

#[test]
fn test_ingest_and_counts() {
    let store = sample_store();
    assert_eq!(store.len(), 5);
    assert!(!store.is_empty());
    assert_eq!(store.animal_count(), 3);
    assert_eq!(store.farm_of(AnimalId(3)), Some(FarmId(2)));
    assert_eq!(store.farm_of(AnimalId(9)), None);
}

#[test]
fn test_track_sorted_by_time() {
    let store = sample_store();
    let track = store
        .animal_track(AnimalId(1), &TimeRange::default())
        .unwrap();
    let ids: Vec<PointId> = track.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PointId(1), PointId(2), PointId(3)]);
}

#[test]
fn test_track_bounds_inclusive() {
    let store = sample_store();
    let range = TimeRange::new(Some(at(10)), Some(at(12)));
    let track = store.animal_track(AnimalId(1), &range).unwrap();
    assert_eq!(track.len(), 2);
    assert_eq!(track[0].timestamp, Some(at(10)));
    assert_eq!(track[1].timestamp, Some(at(12)));

    let until = store
        .animal_track(AnimalId(1), &TimeRange::until(Some(at(9))))
        .unwrap();
    assert_eq!(until.len(), 1);
}

#[test]
fn test_track_of_unknown_animal() {
    let store = sample_store();
    assert_eq!(
        store.animal_track(AnimalId(42), &TimeRange::default()),
        Err(HerdTrackError::UnknownAnimal(AnimalId(42)))
    );
}

#[test]
fn test_track_of_animal_without_fixes() {
    let mut store = sample_store();
    store.register_animal(AnimalId(4), FarmId(1));
    let track = store
        .animal_track(AnimalId(4), &TimeRange::default())
        .unwrap();
    assert!(track.is_empty());
}

#[test]
fn test_latest_per_animal() {
    let store = sample_store();
    let latest = store.latest_per_animal(FarmId(1)).unwrap();
    let ids: Vec<PointId> = latest.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PointId(3), PointId(4)]);

    let other = store.latest_per_animal(FarmId(2)).unwrap();
    assert_eq!(other.len(), 1);
    assert!(store.latest_per_animal(FarmId(99)).unwrap().is_empty());
}

#[test]
fn test_ingest_rejections() {
    let mut store = sample_store();

    assert_eq!(
        store.ingest(fix(10, 42, 8)),
        Err(HerdTrackError::UnknownAnimal(AnimalId(42)))
    );

    assert_eq!(
        store.ingest(fix(11, 1, 8)),
        Err(HerdTrackError::DuplicateObservation {
            animal_id: AnimalId(1),
            timestamp: at(8),
        })
    );

    let mut untimed = fix(12, 1, 8);
    untimed.timestamp = None;
    assert_eq!(
        store.ingest(untimed),
        Err(HerdTrackError::MissingTimestamp {
            point_id: PointId(12)
        })
    );

    assert_eq!(store.len(), 5);
}

#[test]
fn test_ingest_many_skips_rejected() {
    let mut store = MemoryStore::new();
    store.register_animal(AnimalId(1), FarmId(1));

    let stored = store.ingest_many(vec![fix(1, 1, 8), fix(2, 1, 8), fix(3, 5, 9), fix(4, 1, 9)]);
    assert_eq!(stored, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_prune_before() {
    let mut store = sample_store();
    let removed = store.prune_before(at(10));
    assert_eq!(removed, 2);
    assert_eq!(store.len(), 3);

    let track = store
        .animal_track(AnimalId(1), &TimeRange::default())
        .unwrap();
    assert_eq!(track.len(), 2);

    // Animal 2 lost its only fix
    assert!(store.latest_per_animal(FarmId(1)).unwrap().len() == 1);
}

#[test]
fn test_point_ids_unique_across_animals() {
    let mut store = sample_store();

    // Point 1 already belongs to animal 1
    assert_eq!(
        store.ingest(fix(1, 2, 15)),
        Err(HerdTrackError::DuplicatePoint(PointId(1)))
    );
    assert_eq!(store.len(), 5);

    // The farm view stays servable
    let latest = store.latest_per_animal(FarmId(1)).unwrap();
    let profile = ZoomProfile::default();
    let grouped = grouped_latest(&store, FarmId(1), None, &SpatialClusterer::new(&profile));
    assert!(grouped.is_ok());
    assert_eq!(latest.len(), 2);
}

#[test]
fn test_pruned_point_ids_can_be_reused() {
    let mut store = sample_store();
    store.prune_before(at(10));

    // Point 1 (08:00) was pruned, point 2 (10:00) was kept
    assert!(store.ingest(fix(1, 2, 15)).is_ok());
    assert_eq!(
        store.ingest(fix(2, 2, 16)),
        Err(HerdTrackError::DuplicatePoint(PointId(2)))
    );
}

#[test]
fn test_inverted_window_is_empty() {
    let store = sample_store();
    let range = TimeRange::new(Some(at(12)), Some(at(8)));
    assert!(range.is_empty());
    assert!(!range.contains(at(10)));
    assert!(store.animal_track(AnimalId(1), &range).unwrap().is_empty());

    let instant = TimeRange::new(Some(at(10)), Some(at(10)));
    assert!(!instant.is_empty());
    assert!(instant.contains(at(10)));
    let track = store.animal_track(AnimalId(1), &instant).unwrap();
    assert_eq!(track.len(), 1);
    assert_eq!(track[0].id, PointId(2));
}
