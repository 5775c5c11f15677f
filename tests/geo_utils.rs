//! Tests for geo_utils module

use herdtrack::geo_utils::*;
use herdtrack::{Bounds, Coordinate};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_haversine_distance_same_point() {
    let p = Coordinate::new(71.43, 51.13);
    assert_eq!(haversine_distance(&p, &p), 0.0);
}

#[test]
fn test_haversine_distance_known_value() {
    // Astana to Almaty is approximately 970 km
    let astana = Coordinate::new(71.4491, 51.1694);
    let almaty = Coordinate::new(76.8860, 43.2389);
    let dist = haversine_distance(&astana, &almaty);
    assert!(approx_eq(dist, 970_000.0, 25_000.0), "got {dist}");
}

#[test]
fn test_euclidean_distance() {
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(3.0, 4.0);
    assert_eq!(euclidean_distance(&a, &b), 5.0);
    assert_eq!(Crs::WebMercator.distance_m(&a, &b), 5.0);
}

#[test]
fn test_web_mercator_projection() {
    let origin = lonlat_to_web_mercator(0.0, 0.0);
    assert!(approx_eq(origin.x, 0.0, 1e-6));
    assert!(approx_eq(origin.y, 0.0, 1e-6));

    let east = lonlat_to_web_mercator(180.0, 0.0);
    assert!(approx_eq(east.x, WEB_MERCATOR_HALF_WORLD_M, 1e-6));

    let p = lonlat_to_web_mercator(71.0, 51.0);
    let (lon, lat) = web_mercator_to_lonlat(&p);
    assert!(approx_eq(lon, 71.0, 1e-9));
    assert!(approx_eq(lat, 51.0, 1e-9));
}

#[test]
fn test_projection_clamps_poles() {
    let north = lonlat_to_web_mercator(0.0, 90.0);
    assert!(north.y.is_finite());
    assert!(Crs::WebMercator.is_valid(&north));
}

#[test]
fn test_crs_validity() {
    assert!(Crs::Wgs84.is_valid(&Coordinate::new(71.0, 51.0)));
    assert!(!Crs::Wgs84.is_valid(&Coordinate::new(181.0, 51.0)));
    assert!(!Crs::Wgs84.is_valid(&Coordinate::new(71.0, -91.0)));
    assert!(!Crs::Wgs84.is_valid(&Coordinate::new(f64::NAN, 0.0)));

    assert!(Crs::WebMercator.is_valid(&Coordinate::new(7_903_000.0, 6_621_000.0)));
    assert!(!Crs::WebMercator.is_valid(&Coordinate::new(3.0e7, 0.0)));
    assert!(!Crs::WebMercator.is_valid(&Coordinate::new(0.0, f64::INFINITY)));
}

#[test]
fn test_wgs84_envelope_covers_radius() {
    let center = Coordinate::new(71.0, 51.0);
    let envelopes = Crs::Wgs84.search_envelopes(&center, 5_000.0);
    assert_eq!(envelopes.len(), 1);
    let (lower, upper) = envelopes[0];

    // Points exactly 5 km north and east must fall inside the envelope
    let north_lat = 51.0 + (5_000.0 / EARTH_RADIUS_M).to_degrees();
    assert!(north_lat <= upper[1] && lower[1] < 51.0);

    let east = Coordinate::new(upper[0], 51.0);
    assert!(haversine_distance(&center, &east) >= 5_000.0);
    let west = Coordinate::new(lower[0], 51.0);
    assert!(haversine_distance(&center, &west) >= 5_000.0);
}

#[test]
fn test_wgs84_envelope_split_at_antimeridian() {
    let center = Coordinate::new(179.99, 0.0);
    let envelopes = Crs::Wgs84.search_envelopes(&center, 5_000.0);
    assert_eq!(envelopes.len(), 2);

    // The far side of the antimeridian is searched too
    let across = Coordinate::new(-179.99, 0.0);
    assert!(haversine_distance(&center, &across) < 5_000.0);
    assert!(envelopes.iter().any(|(lower, upper)| {
        lower[0] <= across.x && across.x <= upper[0] && lower[1] <= 0.0 && 0.0 <= upper[1]
    }));
    for (lower, upper) in &envelopes {
        assert!(lower[0] >= -180.0 && upper[0] <= 180.0);
    }

    let west = Crs::Wgs84.search_envelopes(&Coordinate::new(-179.99, 0.0), 5_000.0);
    assert_eq!(west.len(), 2);
}

#[test]
fn test_polar_envelope_spans_all_longitudes() {
    let envelopes = Crs::Wgs84.search_envelopes(&Coordinate::new(10.0, 89.99), 5_000.0);
    assert_eq!(envelopes, vec![([-180.0, envelopes[0].0[1]], [180.0, 90.0])]);
}

#[test]
fn test_bounds_center_across_antimeridian() {
    let positions = [Coordinate::new(179.99, 1.0), Coordinate::new(-179.99, -1.0)];

    let center = Crs::Wgs84.bounds_center(&positions).unwrap();
    assert!(center.x.abs() > 179.99, "got {center:?}");
    assert!(approx_eq(center.y, 0.0, 1e-9));

    // Projected positions are boxed as is
    let planar = Crs::WebMercator.bounds_center(&positions).unwrap();
    assert!(approx_eq(planar.x, 0.0, 1e-9));

    assert!(Crs::Wgs84
        .bounds_center(Vec::<Coordinate>::new().iter())
        .is_none());
}

#[test]
fn test_compute_bounds_and_center() {
    let positions = vec![
        Coordinate::new(10.0, -5.0),
        Coordinate::new(30.0, 15.0),
        Coordinate::new(20.0, 0.0),
    ];
    let bounds = compute_bounds(&positions).unwrap();
    assert_eq!(
        bounds,
        Bounds {
            min_x: 10.0,
            max_x: 30.0,
            min_y: -5.0,
            max_y: 15.0,
        }
    );
    assert_eq!(bounds.center(), Coordinate::new(20.0, 5.0));
    assert!(compute_bounds(&[]).is_none());
}

#[test]
fn test_diameter() {
    let positions = vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(1000.0, 0.0),
        Coordinate::new(0.0, 1000.0),
        Coordinate::new(1000.0, 1000.0),
    ];
    let d = diameter_m(&positions, Crs::WebMercator);
    assert!(approx_eq(d, 2f64.sqrt() * 1000.0, 1e-9));

    assert_eq!(diameter_m(&positions[..1], Crs::WebMercator), 0.0);
    assert_eq!(diameter_m(Vec::<Coordinate>::new().iter(), Crs::WebMercator), 0.0);
}
