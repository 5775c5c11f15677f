//! Synthetic herd generator for benchmarking.
//!
//! Generates latest-position snapshots of several herds grazing around known
//! centers plus stray animals, and random-walk tracks for path building.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use herdtrack::synthetic::HerdScenario;
//! use herdtrack::Coordinate;
//!
//! let scenario = HerdScenario {
//!     origin: Coordinate::new(7_903_000.0, 6_621_000.0),
//!     herd_count: 4,
//!     animals_per_herd: 25,
//!     herd_spread_m: 1_500.0,
//!     herd_separation_m: 12_000.0,
//!     stray_count: 10,
//!     seed: 42,
//! };
//!
//! let snapshot = scenario.generate();
//! assert_eq!(snapshot.points.len(), 110);
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::{AnimalId, Coordinate, GeoPoint, PointId};

/// Scenario configuration for a latest-position snapshot (Web Mercator).
#[derive(Debug, Clone)]
pub struct HerdScenario {
    /// Center of the first herd.
    pub origin: Coordinate,
    pub herd_count: usize,
    pub animals_per_herd: usize,
    /// Maximum distance of an animal from its herd center in meters.
    pub herd_spread_m: f64,
    /// Distance between neighbouring herd centers in meters.
    pub herd_separation_m: f64,
    /// Animals scattered far from every herd.
    pub stray_count: usize,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// A generated snapshot with ground truth.
#[derive(Debug, Clone)]
pub struct HerdSnapshot {
    /// One point per animal.
    pub points: Vec<GeoPoint>,
    /// Herd centers, in herd order.
    pub herd_centers: Vec<Coordinate>,
    /// Herd index per point; `None` for strays.
    pub herd_of: Vec<Option<usize>>,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 12, 30, 4, 0, 0)
        .single()
        .unwrap_or_default()
}

fn offset(center: &Coordinate, distance_m: f64, bearing: f64) -> Coordinate {
    Coordinate::new(
        center.x + distance_m * bearing.cos(),
        center.y + distance_m * bearing.sin(),
    )
}

impl HerdScenario {
    /// Generate the snapshot. Point and animal ids start at 1.
    pub fn generate(&self) -> HerdSnapshot {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let now = base_time();

        // Herds sit on a ring so that neighbours are `herd_separation_m` apart.
        let ring_radius = if self.herd_count > 1 {
            self.herd_separation_m / (2.0 * (PI / self.herd_count as f64).sin())
        } else {
            0.0
        };
        let herd_centers: Vec<Coordinate> = (0..self.herd_count)
            .map(|h| {
                let bearing = 2.0 * PI * h as f64 / self.herd_count as f64;
                offset(&self.origin, ring_radius, bearing)
            })
            .collect();

        let mut points = Vec::new();
        let mut herd_of = Vec::new();
        let mut next_id = 1u64;

        for (h, center) in herd_centers.iter().enumerate() {
            for _ in 0..self.animals_per_herd {
                let distance = rng.gen_range(0.0..=self.herd_spread_m);
                let bearing = rng.gen_range(0.0..2.0 * PI);
                let age = Duration::minutes(rng.gen_range(0..120));
                points.push(GeoPoint::new(
                    PointId(next_id),
                    AnimalId(next_id),
                    Some(now - age),
                    offset(center, distance, bearing),
                ));
                herd_of.push(Some(h));
                next_id += 1;
            }
        }

        let stray_radius = ring_radius + self.herd_separation_m * 4.0;
        for _ in 0..self.stray_count {
            let distance = rng.gen_range(stray_radius..stray_radius * 2.0 + 1.0);
            let bearing = rng.gen_range(0.0..2.0 * PI);
            points.push(GeoPoint::new(
                PointId(next_id),
                AnimalId(next_id),
                Some(now),
                offset(&self.origin, distance, bearing),
            ));
            herd_of.push(None);
            next_id += 1;
        }

        HerdSnapshot {
            points,
            herd_centers,
            herd_of,
        }
    }
}

/// Random-walk track of one animal: `steps` fixes every `interval`, each at
/// most `max_step_m` from the previous one.
pub fn random_track(
    animal: AnimalId,
    start: Coordinate,
    steps: usize,
    interval: Duration,
    max_step_m: f64,
    seed: u64,
) -> Vec<GeoPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = base_time();
    let mut position = start;

    (0..steps)
        .map(|i| {
            if i > 0 {
                let step = rng.gen_range(0.0..=max_step_m);
                position = offset(&position, step, rng.gen_range(0.0..2.0 * PI));
            }
            GeoPoint::new(
                PointId(animal.0 * 1_000_000 + i as u64),
                animal,
                Some(t0 + interval * i as i32),
                position,
            )
        })
        .collect()
}
