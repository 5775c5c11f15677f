//! # herdtrack
//!
//! Geolocation clustering and path reconstruction for GPS-collared livestock.
//!
//! This library provides:
//! - Zoom-dependent spatial clustering of the latest position of every animal
//! - Busiest-area detection for the unzoomed overview map
//! - Travel path reconstruction between two instants, with the
//!   "last two points" fallback for sparse data
//! - An in-memory geolocation store and the request-side glue around it
//!
//! ## Features
//!
//! - **`parallel`** - Cluster many farms in parallel with rayon
//! - **`synthetic`** - Deterministic synthetic herd generator for benchmarks
//! - **`cli`** - The `herdtrack-cli` debug binary
//!
//! ## Quick Start
//!
//! ```rust
//! use herdtrack::{cluster_points, AnimalId, Coordinate, GeoPoint, PointId, ZoomKey, ZoomProfile};
//!
//! let points = vec![
//!     GeoPoint::new(PointId(1), AnimalId(1), None, Coordinate::new(0.0, 0.0)),
//!     GeoPoint::new(PointId(2), AnimalId(2), None, Coordinate::new(800.0, 0.0)),
//!     GeoPoint::new(PointId(3), AnimalId(3), None, Coordinate::new(90_000.0, 0.0)),
//! ];
//!
//! let clusters = cluster_points(&points, &ZoomProfile::default(), ZoomKey::Level(14)).unwrap();
//! assert_eq!(clusters.len(), 2);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{HerdTrackError, Result};

// Distance, projection and bounds helpers
pub mod geo_utils;
pub use geo_utils::Crs;

// Zoom level configuration
pub mod zoom;
pub use zoom::{ZoomKey, ZoomProfile, ZoomSetting};

// Union-Find for merging nearby groups
pub mod union_find;
pub use union_find::UnionFind;

// Radius-based recursive clustering
pub mod clustering;
pub use clustering::{cluster_points, Cluster, SpatialClusterer};

// Path reconstruction
pub mod path;
pub use path::{build_path, Path, PathBuilder};

// Geolocation query interface and in-memory store
pub mod store;
pub use store::{GeolocationSource, MemoryStore, TimeRange};

// Request-side orchestration (fallbacks, viewport filtering, response shaping)
pub mod service;
pub use service::{
    grouped_latest, resolve_path, GroupSummary, GroupedPositions, PathFallback, PathRequest,
    ResolvedPath, Viewport,
};
#[cfg(feature = "parallel")]
pub use service::grouped_latest_for_farms;

// Synthetic herd generator for benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a single geolocation record.
    PointId
);
id_type!(
    /// Identifier of a collared animal.
    AnimalId
);
id_type!(
    /// Identifier of the farm an animal belongs to.
    FarmId
);

// ============================================================================
// Core Types
// ============================================================================

/// A planar position.
///
/// Under [`Crs::WebMercator`] `x`/`y` are meters; under [`Crs::Wgs84`] `x` is
/// the longitude and `y` the latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.x, y: c.y }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(c: Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// A single collar observation.
///
/// Created by ingestion and never mutated afterwards. For one animal the
/// `(animal_id, timestamp)` pair is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub id: PointId,
    pub animal_id: AnimalId,
    /// Observation instant. Records imported without a fix time carry `None`.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub position: Coordinate,
}

impl GeoPoint {
    pub fn new(
        id: PointId,
        animal_id: AnimalId,
        timestamp: Option<DateTime<Utc>>,
        position: Coordinate,
    ) -> Self {
        Self {
            id,
            animal_id,
            timestamp,
            position,
        }
    }
}

/// Axis-aligned bounding box of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from positions.
    pub fn from_points<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };

        for p in iter {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_y = bounds.max_y.max(p.y);
        }

        Some(bounds)
    }

    /// Centroid of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}
