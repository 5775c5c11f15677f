//! Geographic utilities: distances, projections and bounds.
//!
//! All points handed to one clustering or path call must share a single
//! [`Crs`]; distances are always returned in meters.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{Bounds, Coordinate};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Sphere radius used by the Web Mercator projection.
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator projection.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Half the width of the projected world, in meters.
pub const WEB_MERCATOR_HALF_WORLD_M: f64 = PI * WEB_MERCATOR_RADIUS_M;

/// Widening applied to lon/lat search envelopes so that the exact
/// great-circle filter never loses boundary points.
const ENVELOPE_MARGIN: f64 = 1.01;

/// Coordinate reference system of [`Coordinate`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Crs {
    /// EPSG:3857, planar meters. Distances are Euclidean in the projected
    /// plane, the way PostGIS `ST_DWithin` measures SRID 3857 geometries.
    #[default]
    WebMercator,
    /// EPSG:4326, x = longitude, y = latitude. Distances are great-circle.
    Wgs84,
}

impl Crs {
    /// Distance between two positions in meters.
    pub fn distance_m(self, a: &Coordinate, b: &Coordinate) -> f64 {
        match self {
            Crs::WebMercator => euclidean_distance(a, b),
            Crs::Wgs84 => haversine_distance(a, b),
        }
    }

    /// Check that a position lies inside this reference system's domain.
    pub fn is_valid(self, c: &Coordinate) -> bool {
        if !c.x.is_finite() || !c.y.is_finite() {
            return false;
        }
        match self {
            Crs::WebMercator => {
                // 1 m of slack for projected poles and the antimeridian
                let limit = WEB_MERCATOR_HALF_WORLD_M + 1.0;
                c.x.abs() <= limit && c.y.abs() <= limit
            }
            Crs::Wgs84 => c.x.abs() <= 180.0 && c.y.abs() <= 90.0,
        }
    }

    /// Axis-aligned envelopes, in native units, that together contain every
    /// position within `radius_m` of `center`.
    ///
    /// Web Mercator always yields one box. Under Wgs84 a box that crosses the
    /// antimeridian is split in two so that both sides are searched.
    pub fn search_envelopes(
        self,
        center: &Coordinate,
        radius_m: f64,
    ) -> Vec<([f64; 2], [f64; 2])> {
        match self {
            Crs::WebMercator => vec![(
                [center.x - radius_m, center.y - radius_m],
                [center.x + radius_m, center.y + radius_m],
            )],
            Crs::Wgs84 => {
                let dlat = (radius_m / EARTH_RADIUS_M).to_degrees() * ENVELOPE_MARGIN;
                let widest_lat = (center.y.abs() + dlat).min(90.0);
                let cos_lat = widest_lat.to_radians().cos();
                let dlng = if cos_lat > 1e-12 {
                    (dlat / cos_lat).min(180.0)
                } else {
                    180.0
                };
                let min_lat = (center.y - dlat).max(-90.0);
                let max_lat = (center.y + dlat).min(90.0);

                let west = center.x - dlng;
                let east = center.x + dlng;
                if dlng >= 180.0 {
                    vec![([-180.0, min_lat], [180.0, max_lat])]
                } else if west < -180.0 {
                    vec![
                        ([-180.0, min_lat], [east, max_lat]),
                        ([west + 360.0, min_lat], [180.0, max_lat]),
                    ]
                } else if east > 180.0 {
                    vec![
                        ([west, min_lat], [180.0, max_lat]),
                        ([-180.0, min_lat], [east - 360.0, max_lat]),
                    ]
                } else {
                    vec![([west, min_lat], [east, max_lat])]
                }
            }
        }
    }

    /// Centroid of the bounding box of `positions`.
    ///
    /// Under Wgs84 a set that straddles the antimeridian is boxed across it,
    /// so the center stays next to its members instead of jumping to lon 0.
    pub fn bounds_center<'a, I>(self, positions: I) -> Option<Coordinate>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let positions: Vec<&Coordinate> = positions.into_iter().collect();
        let bounds = Bounds::from_points(positions.iter().copied())?;
        if self == Crs::WebMercator || bounds.max_x - bounds.min_x <= 180.0 {
            return Some(bounds.center());
        }

        let shifted: Vec<Coordinate> = positions
            .iter()
            .map(|c| Coordinate::new(if c.x < 0.0 { c.x + 360.0 } else { c.x }, c.y))
            .collect();
        let wrapped = Bounds::from_points(&shifted)?;
        if wrapped.max_x - wrapped.min_x >= bounds.max_x - bounds.min_x {
            return Some(bounds.center());
        }
        let center = wrapped.center();
        let x = if center.x > 180.0 { center.x - 360.0 } else { center.x };
        Some(Coordinate::new(x, center.y))
    }
}

/// Planar distance between two projected positions.
#[inline]
pub fn euclidean_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Great-circle distance in meters between two lon/lat positions.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let dlat = (b.y - a.y).to_radians();
    let dlng = (b.x - a.x).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Project a lon/lat pair to Web Mercator meters.
///
/// Latitudes beyond the projection limit are clamped.
pub fn lonlat_to_web_mercator(lon: f64, lat: f64) -> Coordinate {
    let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let x = WEB_MERCATOR_RADIUS_M * lon.to_radians();
    let y = WEB_MERCATOR_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Coordinate::new(x, y)
}

/// Inverse of [`lonlat_to_web_mercator`], returning `(lon, lat)`.
pub fn web_mercator_to_lonlat(c: &Coordinate) -> (f64, f64) {
    let lon = (c.x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y / WEB_MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Compute the bounding box of a set of positions.
pub fn compute_bounds(positions: &[Coordinate]) -> Option<Bounds> {
    Bounds::from_points(positions)
}

/// Largest pairwise distance among the given positions, in meters.
pub fn diameter_m<'a, I>(positions: I, crs: Crs) -> f64
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    let positions: Vec<&Coordinate> = positions.into_iter().collect();
    let mut max = 0.0_f64;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            max = max.max(crs.distance_m(a, b));
        }
    }
    max
}
