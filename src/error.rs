//! Unified error handling for clustering and path reconstruction.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::zoom::ZoomKey;
use crate::{AnimalId, PointId};

/// Minimum number of points needed to draw a path.
pub const MIN_PATH_POINTS: usize = 2;

/// Errors produced by the crate.
///
/// Every error is returned to the caller as a typed value; nothing is retried
/// internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HerdTrackError {
    /// A path was requested from fewer than two points.
    #[error("not enough geolocations to construct a path: got {count} points, need at least 2")]
    InsufficientPoints { count: usize },

    /// A zoom level that the active profile does not configure.
    #[error("zoom key {key} is not configured")]
    UnknownZoomKey { key: ZoomKey },

    /// Clustered member count does not match the input count.
    #[error("clustering produced {clustered} members for {expected} input points")]
    InvariantViolation { expected: usize, clustered: usize },

    #[error("point {point_id} has an invalid coordinate ({x}, {y})")]
    InvalidCoordinate { point_id: PointId, x: f64, y: f64 },

    #[error("point {0} was supplied more than once")]
    DuplicatePoint(PointId),

    #[error("path points must belong to one animal: found {expected} and {found}")]
    MixedAnimals { expected: AnimalId, found: AnimalId },

    #[error("point {point_id} has no timestamp")]
    MissingTimestamp { point_id: PointId },

    #[error("point {point_id} is out of chronological order")]
    OutOfOrder { point_id: PointId },

    #[error("animal {animal_id} already has an observation at {timestamp}")]
    DuplicateObservation {
        animal_id: AnimalId,
        timestamp: DateTime<Utc>,
    },

    #[error("animal {0} is not registered")]
    UnknownAnimal(AnimalId),

    #[error("invalid zoom profile: {0}")]
    InvalidZoomProfile(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HerdTrackError>;
