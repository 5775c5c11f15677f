//! Geolocation storage and the query interface the core reads from.
//!
//! The clustering and path algorithms never query storage themselves:
//! callers load points through [`GeolocationSource`] once and hand the
//! materialized slice to the core.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{HerdTrackError, Result};
use crate::{AnimalId, FarmId, GeoPoint, PointId};

/// Inclusive time window; open on either side when a bound is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>) -> Self {
        Self { after, before }
    }

    /// Everything up to `before`.
    pub fn until(before: Option<DateTime<Utc>>) -> Self {
        Self {
            after: None,
            before,
        }
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.after.map_or(true, |a| time >= a) && self.before.map_or(true, |b| time <= b)
    }

    /// True when `after` is later than `before`; nothing can match.
    pub fn is_empty(&self) -> bool {
        matches!((self.after, self.before), (Some(a), Some(b)) if a > b)
    }

    /// The window as range bounds for ordered-map lookups.
    pub fn bounds(&self) -> (Bound<DateTime<Utc>>, Bound<DateTime<Utc>>) {
        (
            self.after.map_or(Bound::Unbounded, Bound::Included),
            self.before.map_or(Bound::Unbounded, Bound::Included),
        )
    }
}

/// Read-only geolocation queries.
pub trait GeolocationSource {
    /// Points of one animal inside `range`, ascending by time.
    fn animal_track(&self, animal: AnimalId, range: &TimeRange) -> Result<Vec<GeoPoint>>;

    /// The most recent point of every animal on the farm, ordered by animal id.
    fn latest_per_animal(&self, farm: FarmId) -> Result<Vec<GeoPoint>>;
}

/// In-memory geolocation store.
///
/// Tracks are kept sorted by timestamp per animal; every stored point has a
/// timestamp and a point id unique across the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    farms: HashMap<AnimalId, FarmId>,
    tracks: HashMap<AnimalId, BTreeMap<DateTime<Utc>, GeoPoint>>,
    point_ids: HashSet<PointId>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            farms: HashMap::new(),
            tracks: HashMap::new(),
            point_ids: HashSet::new(),
        }
    }

    /// Register an animal on a farm. Re-registering moves it.
    pub fn register_animal(&mut self, animal: AnimalId, farm: FarmId) {
        self.farms.insert(animal, farm);
    }

    /// Store one observation.
    pub fn ingest(&mut self, point: GeoPoint) -> Result<()> {
        if !self.farms.contains_key(&point.animal_id) {
            return Err(HerdTrackError::UnknownAnimal(point.animal_id));
        }
        let timestamp = point
            .timestamp
            .ok_or(HerdTrackError::MissingTimestamp { point_id: point.id })?;
        if self.point_ids.contains(&point.id) {
            return Err(HerdTrackError::DuplicatePoint(point.id));
        }

        let track = self.tracks.entry(point.animal_id).or_default();
        if track.contains_key(&timestamp) {
            return Err(HerdTrackError::DuplicateObservation {
                animal_id: point.animal_id,
                timestamp,
            });
        }
        self.point_ids.insert(point.id);
        track.insert(timestamp, point);
        Ok(())
    }

    /// Store many observations, skipping the ones that are rejected.
    ///
    /// Returns the number of stored points.
    pub fn ingest_many<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut stored = 0;
        for point in points {
            let id = point.id;
            match self.ingest(point) {
                Ok(()) => stored += 1,
                Err(e) => warn!("[Store] Rejected point {}: {}", id, e),
            }
        }
        stored
    }

    /// Drop every observation older than `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for track in self.tracks.values_mut() {
            let kept = track.split_off(&cutoff);
            removed += track.len();
            for point in track.values() {
                self.point_ids.remove(&point.id);
            }
            *track = kept;
        }
        self.tracks.retain(|_, track| !track.is_empty());
        removed
    }

    pub fn farm_of(&self, animal: AnimalId) -> Option<FarmId> {
        self.farms.get(&animal).copied()
    }

    pub fn animal_count(&self) -> usize {
        self.farms.len()
    }

    /// Total stored observations.
    pub fn len(&self) -> usize {
        self.tracks.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(BTreeMap::is_empty)
    }
}

impl GeolocationSource for MemoryStore {
    fn animal_track(&self, animal: AnimalId, range: &TimeRange) -> Result<Vec<GeoPoint>> {
        if !self.farms.contains_key(&animal) {
            return Err(HerdTrackError::UnknownAnimal(animal));
        }
        let track = match self.tracks.get(&animal) {
            Some(track) if !range.is_empty() => track,
            _ => return Ok(Vec::new()),
        };
        Ok(track.range(range.bounds()).map(|(_, p)| p.clone()).collect())
    }

    fn latest_per_animal(&self, farm: FarmId) -> Result<Vec<GeoPoint>> {
        let mut animals: Vec<AnimalId> = self
            .farms
            .iter()
            .filter(|(_, f)| **f == farm)
            .map(|(a, _)| *a)
            .collect();
        animals.sort_unstable();

        Ok(animals
            .into_iter()
            .filter_map(|a| self.tracks.get(&a))
            .filter_map(|track| track.values().next_back().cloned())
            .collect())
    }
}
