//! Travel path reconstruction.
//!
//! Turns the chronologically ordered geolocations of one animal into a single
//! connected line for map rendering. A path needs at least two points; fewer
//! is reported as [`HerdTrackError::InsufficientPoints`] so the caller can
//! retry with a relaxed time filter (see [`crate::service::resolve_path`]).

use chrono::{DateTime, Utc};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::error::{HerdTrackError, Result, MIN_PATH_POINTS};
use crate::geo_utils::Crs;
use crate::{AnimalId, GeoPoint};

/// An animal's path between two instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub animal_id: AnimalId,
    /// Vertices in ascending timestamp order
    pub line: LineString<f64>,
    /// Number of geolocations used (= number of vertices)
    pub point_count: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Length along the line in meters
    pub length_m: f64,
}

/// Builds [`Path`] values from ordered geolocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathBuilder {
    crs: Crs,
}

impl PathBuilder {
    pub fn new(crs: Crs) -> Self {
        Self { crs }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Build a path through `points`.
    ///
    /// The points must belong to one animal, carry timestamps and be sorted
    /// strictly ascending by time. The line visits them in that order.
    pub fn build(&self, points: &[GeoPoint]) -> Result<Path> {
        let (first, rest) = match points.split_first() {
            Some((first, rest)) if points.len() >= MIN_PATH_POINTS => (first, rest),
            _ => {
                return Err(HerdTrackError::InsufficientPoints {
                    count: points.len(),
                })
            }
        };

        let started_at = timestamp_of(first, first.animal_id)?;
        self.check_position(first)?;

        let mut ended_at = started_at;
        let mut last = first.position;
        let mut coords: Vec<Coord<f64>> = Vec::with_capacity(points.len());
        coords.push(first.position.into());
        let mut length_m = 0.0;

        for p in rest {
            let time = timestamp_of(p, first.animal_id)?;
            if time <= ended_at {
                return Err(HerdTrackError::OutOfOrder { point_id: p.id });
            }
            self.check_position(p)?;

            length_m += self.crs.distance_m(&last, &p.position);
            coords.push(p.position.into());
            last = p.position;
            ended_at = time;
        }

        Ok(Path {
            animal_id: first.animal_id,
            point_count: coords.len(),
            line: LineString::new(coords),
            started_at,
            ended_at,
            length_m,
        })
    }

    fn check_position(&self, p: &GeoPoint) -> Result<()> {
        if self.crs.is_valid(&p.position) {
            Ok(())
        } else {
            Err(HerdTrackError::InvalidCoordinate {
                point_id: p.id,
                x: p.position.x,
                y: p.position.y,
            })
        }
    }
}

/// Timestamp of a path point that must belong to `animal`.
fn timestamp_of(p: &GeoPoint, animal: AnimalId) -> Result<DateTime<Utc>> {
    if p.animal_id != animal {
        return Err(HerdTrackError::MixedAnimals {
            expected: animal,
            found: p.animal_id,
        });
    }
    p.timestamp.ok_or(HerdTrackError::MissingTimestamp { point_id: p.id })
}

/// Build a path from Web Mercator `points`.
pub fn build_path(points: &[GeoPoint]) -> Result<Path> {
    PathBuilder::default().build(points)
}
