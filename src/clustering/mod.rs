//! # Spatial Clustering
//!
//! Groups the latest position of every animal into map markers for a zoom
//! level. Dense areas collapse into one cluster, sparse areas show single
//! animals.
//!
//! ## Algorithm
//!
//! 1. Visit anchors in input order. Each unassigned anchor collects every
//!    unassigned point within the level's search radius (inclusive): the
//!    candidate cluster.
//! 2. A single-point candidate is a singleton.
//! 3. At the finest configured level a candidate is final.
//! 4. Otherwise a candidate whose diameter fits inside the level's merge
//!    distance is kept whole; a wider one is re-partitioned with the next
//!    finer level's radii.
//! 5. Groups of the level that hold two points within its merge distance
//!    are unioned, so points that close always share a marker.
//!
//! Recursion depth is bounded by the number of configured levels.
//!
//! The overview key is two operations: [`SpatialClusterer::find_busiest_area`]
//! picks the most populated group at the overview radius, then that group
//! alone is partitioned at the finest level.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::{HerdTrackError, Result};
use crate::geo_utils::{diameter_m, Crs};
use crate::zoom::{ZoomKey, ZoomProfile};
use crate::union_find::UnionFind;
use crate::{Coordinate, GeoPoint, PointId};

pub mod rtree;

use rtree::{build_rtree, within_radius};

/// A group of points collapsed to one map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Points in this group
    pub member_ids: BTreeSet<PointId>,
    /// Centroid of the members' bounding box
    pub center: Coordinate,
    /// Most recent timestamp among members that have one
    pub latest_time: Option<DateTime<Utc>>,
    pub member_count: usize,
}

impl Cluster {
    /// `None` for an empty member list.
    fn from_members(points: &[GeoPoint], members: &[usize], crs: Crs) -> Option<Self> {
        let center = crs.bounds_center(members.iter().map(|&i| &points[i].position))?;
        let latest_time = members.iter().filter_map(|&i| points[i].timestamp).max();
        let member_ids: BTreeSet<PointId> = members.iter().map(|&i| points[i].id).collect();

        Some(Self {
            member_count: member_ids.len(),
            member_ids,
            center,
            latest_time,
        })
    }

    pub fn is_singleton(&self) -> bool {
        self.member_count == 1
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.member_ids.contains(&id)
    }
}

/// Zoom-aware clusterer over an in-memory point set.
///
/// Holds only borrowed configuration, so one instance can serve concurrent
/// requests.
#[derive(Debug, Clone, Copy)]
pub struct SpatialClusterer<'a> {
    profile: &'a ZoomProfile,
    crs: Crs,
}

impl<'a> SpatialClusterer<'a> {
    /// Create a clusterer for Web Mercator positions.
    pub fn new(profile: &'a ZoomProfile) -> Self {
        Self {
            profile,
            crs: Crs::WebMercator,
        }
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    pub fn profile(&self) -> &'a ZoomProfile {
        self.profile
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Partition `points` into clusters for the given zoom key.
    ///
    /// Every point lands in exactly one cluster, except in overview mode
    /// where only the busiest area is returned.
    pub fn cluster(&self, points: &[GeoPoint], key: ZoomKey) -> Result<Vec<Cluster>> {
        let setting = self.profile.setting(key)?;
        self.validate(points)?;

        if points.is_empty() {
            return Ok(Vec::new());
        }

        let (members, groups) = match key {
            ZoomKey::Level(level) => {
                let members: Vec<usize> = (0..points.len()).collect();
                let groups = self.partition(points, &members, level)?;
                (members, groups)
            }
            ZoomKey::Overview => {
                let members = self.busiest_members(points, setting.search_radius_m());
                let finest = self.profile.finest_level();
                let groups = self.partition(points, &members, finest)?;
                (members, groups)
            }
        };

        check_partition(points, &members, &groups)?;

        debug!(
            "[Clustering] {} points -> {} groups at zoom {}",
            members.len(),
            groups.len(),
            key
        );

        groups
            .iter()
            .map(|g| Cluster::from_members(points, g, self.crs))
            .collect::<Option<Vec<Cluster>>>()
            .ok_or(HerdTrackError::InvariantViolation {
                expected: members.len(),
                clustered: members.len(),
            })
    }

    /// Members of the most populated group at the overview radius.
    ///
    /// Groups are formed in a single pass without recursion. When several
    /// groups share the maximum size, the one whose anchor comes first in
    /// input order wins.
    pub fn find_busiest_area(&self, points: &[GeoPoint]) -> Result<Vec<PointId>> {
        self.validate(points)?;
        let radius_m = self.profile.overview().search_radius_m();
        Ok(self
            .busiest_members(points, radius_m)
            .into_iter()
            .map(|i| points[i].id)
            .collect())
    }

    fn busiest_members(&self, points: &[GeoPoint], radius_m: f64) -> Vec<usize> {
        let members: Vec<usize> = (0..points.len()).collect();
        let groups = self.radius_groups(points, &members, radius_m);

        let mut busiest: Vec<usize> = Vec::new();
        for group in groups {
            if group.len() > busiest.len() {
                busiest = group;
            }
        }

        info!(
            "[Clustering] Busiest area holds {} of {} points",
            busiest.len(),
            points.len()
        );
        busiest
    }

    /// Recursive partition of `members` (indices into `points`) at `level`.
    fn partition(
        &self,
        points: &[GeoPoint],
        members: &[usize],
        level: u8,
    ) -> Result<Vec<Vec<usize>>> {
        let setting = self.profile.level(level)?;
        let finer = self.profile.finer_level(level);
        let candidates = self.radius_groups(points, members, setting.search_radius_m());

        debug!(
            "[Clustering] level {}: {} members -> {} candidates",
            level,
            members.len(),
            candidates.len()
        );

        let mut groups = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let next = match finer {
                Some(next) if candidate.len() > 1 => next,
                _ => {
                    groups.push(candidate);
                    continue;
                }
            };

            let spread = diameter_m(candidate.iter().map(|&i| &points[i].position), self.crs);
            if spread <= setting.merge_distance_m() {
                groups.push(candidate);
            } else {
                groups.extend(self.partition(points, &candidate, next)?);
            }
        }

        Ok(self.merge_close_groups(points, groups, setting.merge_distance_m()))
    }

    /// Union every pair of groups holding two points within `merge_m` of each
    /// other. Merged groups keep the position of their earliest part.
    fn merge_close_groups(
        &self,
        points: &[GeoPoint],
        groups: Vec<Vec<usize>>,
        merge_m: f64,
    ) -> Vec<Vec<usize>> {
        if groups.len() < 2 || merge_m <= 0.0 {
            return groups;
        }

        let owner: HashMap<usize, usize> = groups
            .iter()
            .enumerate()
            .flat_map(|(g, members)| members.iter().map(move |&i| (i, g)))
            .collect();
        let members: Vec<usize> = groups.iter().flatten().copied().collect();
        let tree = build_rtree(points, &members);

        let mut uf = UnionFind::with_capacity(groups.len());
        for g in 0..groups.len() {
            uf.make_set(g);
        }
        for &i in &members {
            let Some(&own) = owner.get(&i) else {
                continue;
            };
            for j in within_radius(&tree, &points[i].position, merge_m, self.crs) {
                if let Some(&other) = owner.get(&j) {
                    uf.union(&own, &other);
                }
            }
        }

        let mut merged: Vec<Vec<usize>> = uf.groups().into_values().collect();
        if merged.len() == groups.len() {
            return groups;
        }
        merged.sort_unstable_by_key(|parts| parts.first().copied());

        debug!(
            "[Clustering] merged {} groups into {} within {:.0} m",
            groups.len(),
            merged.len(),
            merge_m
        );

        merged
            .into_iter()
            .map(|parts| {
                parts
                    .into_iter()
                    .flat_map(|g| groups[g].iter().copied())
                    .collect()
            })
            .collect()
    }

    /// Greedy anchor grouping: each unassigned member in order claims every
    /// unassigned member within `radius_m` of it.
    fn radius_groups(
        &self,
        points: &[GeoPoint],
        members: &[usize],
        radius_m: f64,
    ) -> Vec<Vec<usize>> {
        let tree = build_rtree(points, members);
        let mut assigned: HashSet<usize> = HashSet::with_capacity(members.len());
        let mut groups = Vec::new();

        for &anchor in members {
            if assigned.contains(&anchor) {
                continue;
            }

            let group: Vec<usize> =
                within_radius(&tree, &points[anchor].position, radius_m, self.crs)
                    .into_iter()
                    .filter(|i| !assigned.contains(i))
                    .collect();

            assigned.extend(group.iter().copied());
            groups.push(group);
        }

        groups
    }

    fn validate(&self, points: &[GeoPoint]) -> Result<()> {
        let mut seen: HashSet<PointId> = HashSet::with_capacity(points.len());
        for p in points {
            if !self.crs.is_valid(&p.position) {
                return Err(HerdTrackError::InvalidCoordinate {
                    point_id: p.id,
                    x: p.position.x,
                    y: p.position.y,
                });
            }
            if !seen.insert(p.id) {
                return Err(HerdTrackError::DuplicatePoint(p.id));
            }
        }
        Ok(())
    }
}

/// Verify that `groups` partitions `members`: no duplicates, no omissions.
fn check_partition(points: &[GeoPoint], members: &[usize], groups: &[Vec<usize>]) -> Result<()> {
    let clustered: usize = groups.iter().map(Vec::len).sum();
    let has_empty = groups.iter().any(Vec::is_empty);
    let distinct: HashSet<PointId> = groups.iter().flatten().map(|&i| points[i].id).collect();
    let expected: HashSet<PointId> = members.iter().map(|&i| points[i].id).collect();

    if !has_empty && clustered == members.len() && distinct == expected {
        return Ok(());
    }

    error!(
        "[Clustering] Partition invariant violated: {} members clustered ({} distinct) for {} inputs",
        clustered,
        distinct.len(),
        members.len()
    );
    debug_assert!(false, "point ids must be unique across every group");

    Err(HerdTrackError::InvariantViolation {
        expected: members.len(),
        clustered,
    })
}

/// Cluster Web Mercator `points` at `key` using `profile`.
pub fn cluster_points(
    points: &[GeoPoint],
    profile: &ZoomProfile,
    key: ZoomKey,
) -> Result<Vec<Cluster>> {
    SpatialClusterer::new(profile).cluster(points, key)
}
