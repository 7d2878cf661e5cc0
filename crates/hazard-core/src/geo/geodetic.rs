//! Spherical-earth geodetic formulas (Aviation Formulary conventions).
//!
//! Angles are decimal degrees, distances are kilometres, azimuths are
//! measured clockwise from north in `[0, 360)`.

use super::Point;
use crate::common::constants::EARTH_RADIUS_KM;
use std::f64::consts::{FRAC_PI_2, PI};

pub fn geodetic_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let half_chord = ((lat1 - lat2) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon1 - lon2) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * half_chord.sqrt().asin()
}

pub fn azimuth(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let cos_lat2 = lat2.cos();
    let true_course = ((lon1 - lon2).sin() * cos_lat2)
        .atan2(lat1.cos() * lat2.sin() - lat1.sin() * cos_lat2 * (lon1 - lon2).cos())
        .to_degrees();
    (360.0 - true_course).rem_euclid(360.0)
}

/// Straight-line distance combining the geodetic and depth separations.
pub fn distance(lon1: f64, lat1: f64, depth1: f64, lon2: f64, lat2: f64, depth2: f64) -> f64 {
    let hdist = geodetic_distance(lon1, lat1, lon2, lat2);
    let vdist = depth1 - depth2;
    (hdist * hdist + vdist * vdist).sqrt()
}

pub fn point_at(lon: f64, lat: f64, azimuth: f64, distance: f64) -> (f64, f64) {
    let (rlon, rlat) = (lon.to_radians(), lat.to_radians());
    let tc = (360.0 - azimuth).to_radians();
    let angular = distance / EARTH_RADIUS_KM;
    let (sin_dist, cos_dist) = angular.sin_cos();
    let (sin_lat, cos_lat) = rlat.sin_cos();
    let sin_lat2 = sin_lat * cos_dist + cos_lat * sin_dist * tc.cos();
    let lat2 = sin_lat2.asin().to_degrees();
    let dlon = (tc.sin() * sin_dist * cos_lat).atan2(cos_dist - sin_lat * sin_lat2);
    let lon2 = (rlon - dlon + PI).rem_euclid(2.0 * PI) - PI;
    (lon2.to_degrees(), lat2)
}

/// `npoints` points starting at the reference one along the arc of the
/// given azimuth, spread evenly over `hdist` horizontally and `vdist` in depth.
pub fn npoints_towards(
    origin: Point,
    azimuth: f64,
    hdist: f64,
    vdist: f64,
    npoints: usize,
) -> Vec<Point> {
    if npoints < 2 {
        return vec![origin];
    }
    let intervals = (npoints - 1) as f64;
    let mut points = Vec::with_capacity(npoints);
    points.push(origin);
    for index in 1..npoints {
        let fraction = index as f64 / intervals;
        let (lon, lat) = point_at(origin.lon, origin.lat, azimuth, hdist * fraction);
        points.push(Point::new(lon, lat, origin.depth + vdist * fraction));
    }
    points
}

/// Exactly `npoints` points from `start` to `end`, both included verbatim.
pub fn npoints_between(start: Point, end: Point, npoints: usize) -> Vec<Point> {
    let hdist = geodetic_distance(start.lon, start.lat, end.lon, end.lat);
    let vdist = end.depth - start.depth;
    let mut points = npoints_towards(
        start,
        azimuth(start.lon, start.lat, end.lon, end.lat),
        hdist,
        vdist,
        npoints,
    );
    if npoints >= 2 {
        if let Some(last) = points.last_mut() {
            *last = end;
        }
    }
    points
}

/// Points spaced by `length` km from `start` towards `end`. The count of
/// intervals is the rounded ratio of the total distance to `length`, so the
/// last point may fall slightly short of or beyond `end`.
pub fn intervals_between(start: Point, end: Point, length: f64) -> Vec<Point> {
    let hdist = geodetic_distance(start.lon, start.lat, end.lon, end.lat);
    let vdist = end.depth - start.depth;
    let total_distance = round_to((hdist * hdist + vdist * vdist).sqrt(), 7);
    let num_intervals = (total_distance / length).round() as usize;
    if num_intervals == 0 {
        return vec![start];
    }
    let dist_factor = (length * num_intervals as f64) / total_distance;
    npoints_towards(
        start,
        azimuth(start.lon, start.lat, end.lon, end.lat),
        hdist * dist_factor,
        vdist * dist_factor,
        num_intervals + 1,
    )
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Signed distance from a point to the great circle through `(alon, alat)`
/// with azimuth `aazimuth`; positive on the right-hand side of the arc.
pub fn distance_to_arc(alon: f64, alat: f64, aazimuth: f64, plon: f64, plat: f64) -> f64 {
    let azimuth_to_target = azimuth(alon, alat, plon, plat);
    let distance_to_target = geodetic_distance(alon, alat, plon, plat);
    let t_angle = (azimuth_to_target - aazimuth + 360.0).rem_euclid(360.0);
    let angle = (t_angle.to_radians().sin() * (distance_to_target / EARTH_RADIUS_KM).sin())
        .clamp(-1.0, 1.0)
        .acos();
    (FRAC_PI_2 - angle) * EARTH_RADIUS_KM
}

/// Shortest distance from a point to the segment `start..end`. The sign is
/// negative on the left of the segment direction when the projection falls
/// inside the segment.
pub fn min_distance_to_segment(start: Point, end: Point, lon: f64, lat: f64) -> f64 {
    let seg_azimuth = azimuth(start.lon, start.lat, end.lon, end.lat);
    let azimuth1 = azimuth(start.lon, start.lat, lon, lat);
    let azimuth2 = azimuth(end.lon, end.lat, lon, lat);
    let inside = (seg_azimuth - azimuth1).to_radians().cos() >= 0.0
        && (seg_azimuth - azimuth2).to_radians().cos() <= 0.0;
    let magnitude = if inside {
        distance_to_arc(start.lon, start.lat, seg_azimuth, lon, lat).abs()
    } else {
        geodetic_distance(start.lon, start.lat, lon, lat)
            .min(geodetic_distance(end.lon, end.lat, lon, lat))
    };
    if (azimuth1 - seg_azimuth).to_radians().sin() < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

pub fn middle_point(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> (f64, f64) {
    if lon1 == lon2 && lat1 == lat2 {
        return (lon1, lat1);
    }
    let dist = geodetic_distance(lon1, lat1, lon2, lat2);
    let az = azimuth(lon1, lat1, lon2, lat2);
    point_at(lon1, lat1, az, dist / 2.0)
}

/// Signed longitudinal extent from `lon1` to `lon2`, within `[-180, 180)`.
pub fn longitudinal_extent(lon1: f64, lon2: f64) -> f64 {
    (lon2 - lon1 + 180.0).rem_euclid(360.0) - 180.0
}
