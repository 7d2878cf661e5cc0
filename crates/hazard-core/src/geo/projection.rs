use super::geodetic::{geodetic_distance, longitudinal_extent, middle_point};
use super::{GeoError, GeoResult};
use crate::common::constants::EARTH_RADIUS_KM;
use std::f64::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalBoundingBox {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

/// Smallest longitude/latitude box holding every point. Collections that
/// straddle the international date line get `west > east`.
pub fn spherical_bounding_box(lons: &[f64], lats: &[f64]) -> GeoResult<SphericalBoundingBox> {
    if lons.is_empty() || lons.len() != lats.len() {
        return Err(GeoError::InvalidMesh(
            "bounding box needs matching, non-empty coordinate arrays".to_string(),
        ));
    }
    let north = lats.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let south = lats.iter().copied().fold(f64::INFINITY, f64::min);
    let mut west = lons.iter().copied().fold(f64::INFINITY, f64::min);
    let mut east = lons.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if longitudinal_extent(west, east) < 0.0 {
        west = lons
            .iter()
            .copied()
            .filter(|lon| *lon > 0.0)
            .fold(f64::INFINITY, f64::min);
        east = lons
            .iter()
            .copied()
            .filter(|lon| *lon < 0.0)
            .fold(f64::NEG_INFINITY, f64::max);
        let spans = lons.iter().all(|lon| {
            longitudinal_extent(west, *lon) >= 0.0 && longitudinal_extent(*lon, east) >= 0.0
        });
        if !spans {
            return Err(GeoError::BoundingBoxTooWide);
        }
    }

    Ok(SphericalBoundingBox {
        west,
        east,
        north,
        south,
    })
}

/// Orthographic projection centred on the middle of a bounding box.
/// Projected coordinates are kilometres on the tangent plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicProjection {
    lam0: f64,
    phi0: f64,
    center_lon: f64,
    center_lat: f64,
}

impl OrthographicProjection {
    pub fn from_bounding_box(bbox: SphericalBoundingBox) -> Self {
        let (center_lon, center_lat) = middle_point(bbox.west, bbox.north, bbox.east, bbox.south);
        Self {
            lam0: center_lon.to_radians(),
            phi0: center_lat.to_radians(),
            center_lon,
            center_lat,
        }
    }

    pub fn from_lons_lats(lons: &[f64], lats: &[f64]) -> GeoResult<Self> {
        spherical_bounding_box(lons, lats).map(Self::from_bounding_box)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_lon, self.center_lat)
    }

    pub fn project(&self, lon: f64, lat: f64) -> GeoResult<(f64, f64)> {
        if geodetic_distance(self.center_lon, self.center_lat, lon, lat)
            > EARTH_RADIUS_KM * FRAC_PI_2
        {
            return Err(GeoError::ProjectionOutOfRange { lon, lat });
        }
        let lambda = lon.to_radians() - self.lam0;
        let phi = lat.to_radians();
        let cos_phi = phi.cos();
        let xx = cos_phi * lambda.sin() * EARTH_RADIUS_KM;
        let yy = (self.phi0.cos() * phi.sin() - self.phi0.sin() * cos_phi * lambda.cos())
            * EARTH_RADIUS_KM;
        Ok((xx, yy))
    }

    pub fn project_all(&self, lons: &[f64], lats: &[f64]) -> GeoResult<Vec<(f64, f64)>> {
        lons.iter()
            .zip(lats)
            .map(|(lon, lat)| self.project(*lon, *lat))
            .collect()
    }

    pub fn unproject(&self, xx: f64, yy: f64) -> (f64, f64) {
        let x = xx / EARTH_RADIUS_KM;
        let y = yy / EARTH_RADIUS_KM;
        let (sin_phi0, cos_phi0) = self.phi0.sin_cos();
        let cos_c = (1.0 - (x * x + y * y)).max(0.0).sqrt();
        let phi = (cos_c * sin_phi0 + y * cos_phi0).clamp(-1.0, 1.0).asin();
        let lambda = x.atan2(cos_phi0 * cos_c - y * sin_phi0);
        let mut lon = (self.lam0 + lambda).to_degrees();
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        (lon, phi.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::{OrthographicProjection, spherical_bounding_box};
    use crate::geo::GeoError;

    #[test]
    fn bounding_box_handles_date_line_crossing() {
        let bbox = spherical_bounding_box(&[179.5, -179.5, 178.0], &[1.0, -1.0, 0.0])
            .expect("bbox should build");
        assert_eq!(bbox.west, 178.0);
        assert_eq!(bbox.east, -179.5);
        assert_eq!(bbox.north, 1.0);
        assert_eq!(bbox.south, -1.0);
    }

    #[test]
    fn bounding_box_rejects_collections_wider_than_half_the_globe() {
        let error = spherical_bounding_box(&[-120.0, 10.0, 120.0], &[0.0, 0.0, 0.0])
            .expect_err("extent wider than 180 deg");
        assert_eq!(error, GeoError::BoundingBoxTooWide);
    }

    #[test]
    fn projection_round_trips_nearby_points() {
        let projection = OrthographicProjection::from_lons_lats(&[10.0, 11.0], &[45.0, 46.0])
            .expect("projection should build");
        let (x, y) = projection.project(10.2, 45.7).expect("point is near the center");
        let (lon, lat) = projection.unproject(x, y);
        assert!((lon - 10.2).abs() < 1.0e-9);
        assert!((lat - 45.7).abs() < 1.0e-9);
    }

    #[test]
    fn projection_preserves_short_distances() {
        let projection =
            OrthographicProjection::from_lons_lats(&[0.0], &[0.0]).expect("projection");
        let (x, y) = projection.project(0.1, 0.0).expect("near point");
        let expected = crate::geo::geodetic_distance(0.0, 0.0, 0.1, 0.0);
        assert!((x - expected).abs() < 1.0e-3);
        assert!(y.abs() < 1.0e-9);
    }

    #[test]
    fn projection_rejects_the_far_hemisphere() {
        let projection =
            OrthographicProjection::from_lons_lats(&[0.0], &[0.0]).expect("projection");
        assert!(projection.project(120.0, 0.0).is_err());
    }
}
