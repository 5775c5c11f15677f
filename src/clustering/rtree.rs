//! R-tree indexed point types and radius queries.

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::Crs;
use crate::{Coordinate, GeoPoint};

/// Slack added to inclusive radius comparisons to absorb rounding.
const DISTANCE_EPSILON_M: f64 = 1e-6;

/// A geolocation position with its index into the clustered slice
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub idx: usize,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

/// Build R-tree over the selected members of `points`
pub fn build_rtree(points: &[GeoPoint], members: &[usize]) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = members
        .iter()
        .map(|&idx| IndexedPoint {
            idx,
            x: points[idx].position.x,
            y: points[idx].position.y,
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Indices of every indexed point within `radius_m` of `center`, boundary
/// included, in ascending index order.
pub fn within_radius(
    tree: &RTree<IndexedPoint>,
    center: &Coordinate,
    radius_m: f64,
    crs: Crs,
) -> Vec<usize> {
    let reach = radius_m + DISTANCE_EPSILON_M;
    let mut hits: Vec<usize> = Vec::new();
    for (lower, upper) in crs.search_envelopes(center, reach) {
        let envelope = AABB::from_corners(lower, upper);
        hits.extend(
            tree.locate_in_envelope(&envelope)
                .filter(|p| crs.distance_m(center, &Coordinate::new(p.x, p.y)) <= reach)
                .map(|p| p.idx),
        );
    }
    hits.sort_unstable();
    hits.dedup();
    hits
}
