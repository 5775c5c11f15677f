//! Request-side orchestration around the core algorithms.
//!
//! These functions play the caller's part: they query a
//! [`GeolocationSource`], apply the path fallback sequence, restrict points
//! to the requested viewport and shape clusters into map markers.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::clustering::SpatialClusterer;
use crate::error::{HerdTrackError, Result};
use crate::path::{Path, PathBuilder};
use crate::store::{GeolocationSource, TimeRange};
use crate::zoom::ZoomKey;
use crate::{AnimalId, Coordinate, FarmId, GeoPoint};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Paths
// ============================================================================

/// Path query for one animal, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRequest {
    pub animal_id: AnimalId,
    pub time_after: Option<DateTime<Utc>>,
    pub time_before: Option<DateTime<Utc>>,
}

/// How a path was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathFallback {
    /// Built from every point in the requested window.
    None,
    /// The window held fewer than two points; built from the last two points
    /// at or before `time_before`, ignoring `time_after`.
    LastTwoBeforeEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPath {
    pub path: Path,
    pub fallback: PathFallback,
}

/// Resolve an animal's path, falling back to the two most recent points as of
/// `time_before` when the requested window is too sparse.
///
/// Without a `time_after` there is nothing to relax and
/// [`HerdTrackError::InsufficientPoints`] is returned as is.
pub fn resolve_path<S>(
    source: &S,
    request: &PathRequest,
    builder: &PathBuilder,
) -> Result<ResolvedPath>
where
    S: GeolocationSource + ?Sized,
{
    let range = TimeRange::new(request.time_after, request.time_before);
    let track = source.animal_track(request.animal_id, &range)?;

    match builder.build(&track) {
        Ok(path) => Ok(ResolvedPath {
            path,
            fallback: PathFallback::None,
        }),
        Err(HerdTrackError::InsufficientPoints { count }) if request.time_after.is_some() => {
            info!(
                "[Path] Animal {} has {} points in window, using last two before end",
                request.animal_id, count
            );
            let relaxed =
                source.animal_track(request.animal_id, &TimeRange::until(request.time_before))?;
            let tail = &relaxed[relaxed.len().saturating_sub(2)..];
            Ok(ResolvedPath {
                path: builder.build(tail)?,
                fallback: PathFallback::LastTwoBeforeEnd,
            })
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// Grouped positions
// ============================================================================

/// Map viewport of a grouping request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
}

/// Map marker for a multi-animal cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub position: Coordinate,
    pub time: Option<DateTime<Utc>>,
    pub animals_num: usize,
}

/// Latest farm positions shaped for the map: lone animals and groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedPositions {
    pub animals: Vec<GeoPoint>,
    pub groups: Vec<GroupSummary>,
}

impl GroupedPositions {
    /// Number of animals represented, grouped or not.
    pub fn animal_total(&self) -> usize {
        self.animals.len() + self.groups.iter().map(|g| g.animals_num).sum::<usize>()
    }
}

/// Cluster the latest position of every animal on a farm.
///
/// Without a viewport the busiest area is summarized. With one, only points
/// within the zoom level's search radius of the center are clustered.
pub fn grouped_latest<S>(
    source: &S,
    farm: FarmId,
    viewport: Option<Viewport>,
    clusterer: &SpatialClusterer<'_>,
) -> Result<GroupedPositions>
where
    S: GeolocationSource + ?Sized,
{
    let latest = source.latest_per_animal(farm)?;

    let (points, key) = match viewport {
        None => (latest, ZoomKey::Overview),
        Some(view) => {
            let radius_m = clusterer.profile().level(view.zoom)?.search_radius_m();
            let crs = clusterer.crs();
            let nearby: Vec<GeoPoint> = latest
                .into_iter()
                .filter(|p| crs.distance_m(&view.center, &p.position) <= radius_m)
                .collect();
            (nearby, ZoomKey::Level(view.zoom))
        }
    };

    let clusters = clusterer.cluster(&points, key)?;

    let mut grouped = GroupedPositions::default();
    for cluster in clusters {
        if cluster.is_singleton() {
            if let Some(point) = points.iter().find(|p| cluster.contains(p.id)) {
                grouped.animals.push(point.clone());
            }
        } else {
            grouped.groups.push(GroupSummary {
                position: cluster.center,
                time: cluster.latest_time,
                animals_num: cluster.member_count,
            });
        }
    }

    Ok(grouped)
}

/// Run [`grouped_latest`] for many farms in parallel.
#[cfg(feature = "parallel")]
pub fn grouped_latest_for_farms<S>(
    source: &S,
    farms: &[FarmId],
    viewport: Option<Viewport>,
    clusterer: &SpatialClusterer<'_>,
) -> Vec<(FarmId, Result<GroupedPositions>)>
where
    S: GeolocationSource + Sync + ?Sized,
{
    farms
        .par_iter()
        .map(|&farm| (farm, grouped_latest(source, farm, viewport, clusterer)))
        .collect()
}
