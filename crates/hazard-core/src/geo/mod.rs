//! Geometry primitives used to describe sources and to measure the
//! distance from ruptures to sites.

pub mod geodetic;
mod line;
mod mesh;
mod polygon;
mod projection;
pub mod surface;

pub use geodetic::{
    azimuth, distance, distance_to_arc, geodetic_distance, intervals_between,
    longitudinal_extent, min_distance_to_segment, npoints_between, npoints_towards, point_at,
};
pub use line::Line;
pub use mesh::RectangularMesh;
pub use polygon::Polygon;
pub use projection::{OrthographicProjection, SphericalBoundingBox, spherical_bounding_box};
pub use surface::{
    ComplexFaultSurface, MeshSurface, MultiSurface, PlanarSurface, SimpleFaultSurface, Surface,
};

use crate::domain::HazardError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub depth: f64,
}

impl Point {
    pub const fn new(lon: f64, lat: f64, depth: f64) -> Self {
        Self { lon, lat, depth }
    }

    pub const fn surface(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, 0.0)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        distance(
            self.lon,
            self.lat,
            self.depth,
            other.lon,
            other.lat,
            other.depth,
        )
    }

    pub fn epicentral_distance(&self, other: &Point) -> f64 {
        geodetic_distance(self.lon, self.lat, other.lon, other.lat)
    }

    pub fn azimuth(&self, other: &Point) -> f64 {
        azimuth(self.lon, self.lat, other.lon, other.lat)
    }

    /// Point reached after moving `horizontal` km along `azimuth` and
    /// `vertical` km downwards.
    pub fn point_at(&self, horizontal: f64, vertical: f64, azimuth: f64) -> Point {
        let (lon, lat) = point_at(self.lon, self.lat, azimuth, horizontal);
        Point::new(lon, lat, self.depth + vertical)
    }

    pub fn equally_spaced_points(&self, other: &Point, spacing: f64) -> Vec<Point> {
        intervals_between(*self, *other, spacing)
    }

    pub fn middle_point(&self, other: &Point) -> Point {
        let (lon, lat) = geodetic::middle_point(self.lon, self.lat, other.lon, other.lat);
        Point::new(lon, lat, (self.depth + other.depth) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("point ({lon}, {lat}) is too far from the projection center")]
    ProjectionOutOfRange { lon: f64, lat: f64 },
    #[error("points collection has longitudinal extent wider than 180 deg")]
    BoundingBoxTooWide,
    #[error("{0}")]
    InvalidLine(String),
    #[error("{0}")]
    InvalidPolygon(String),
    #[error("{0}")]
    InvalidMesh(String),
    #[error("{0}")]
    InvalidFaultGeometry(String),
}

impl From<GeoError> for HazardError {
    fn from(error: GeoError) -> Self {
        match error {
            GeoError::ProjectionOutOfRange { .. } => {
                HazardError::computation("RUN.GEOMETRY", error.to_string())
            }
            _ => HazardError::configuration("CONFIG.GEOMETRY", error.to_string()),
        }
    }
}

pub type GeoResult<T> = Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::{GeoError, Point};
    use crate::domain::{HazardError, HazardErrorCategory};

    #[test]
    fn point_helpers_agree_with_geodetic_functions() {
        let origin = Point::new(10.0, 45.0, 5.0);
        let moved = origin.point_at(20.0, 3.0, 90.0);
        assert!((origin.epicentral_distance(&moved) - 20.0).abs() < 1.0e-9);
        assert!((moved.depth - 8.0).abs() < 1.0e-12);
        assert!((origin.azimuth(&moved) - 90.0).abs() < 0.1);
        let expected = (20.0_f64.powi(2) + 9.0).sqrt();
        assert!((origin.distance(&moved) - expected).abs() < 1.0e-6);
        assert!((origin.middle_point(&moved).depth - 6.5).abs() < 1.0e-12);
    }

    #[test]
    fn point_depth_defaults_to_surface() {
        let point: Point =
            serde_json::from_str(r#"{"lon": 1.5, "lat": -2.0}"#).expect("point should parse");
        assert_eq!(point, Point::surface(1.5, -2.0));
    }

    #[test]
    fn geo_errors_map_to_hazard_categories() {
        let projection: HazardError = GeoError::ProjectionOutOfRange { lon: 0.0, lat: 0.0 }.into();
        assert_eq!(projection.category(), HazardErrorCategory::ComputationError);
        let mesh: HazardError = GeoError::InvalidMesh("empty mesh".to_string()).into();
        assert_eq!(mesh.category(), HazardErrorCategory::ConfigurationError);
        assert_eq!(mesh.placeholder(), "CONFIG.GEOMETRY");
    }
}
