use super::Surface;
use crate::geo::{GeoError, GeoResult, Point, SphericalBoundingBox, spherical_bounding_box};

/// Union of several surfaces treated as a single rupture plane.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSurface {
    surfaces: Vec<Surface>,
    areas: Vec<f64>,
}

impl MultiSurface {
    pub fn new(surfaces: Vec<Surface>) -> GeoResult<Self> {
        if surfaces.is_empty() {
            return Err(GeoError::InvalidMesh(
                "a multi surface needs at least one member".to_string(),
            ));
        }
        let areas = surfaces.iter().map(Surface::area).collect();
        Ok(Self { surfaces, areas })
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn area(&self) -> f64 {
        self.areas.iter().sum()
    }

    fn area_weighted(&self, value: impl Fn(&Surface) -> f64) -> f64 {
        let total = self.area();
        if total == 0.0 {
            let count = self.surfaces.len() as f64;
            return self.surfaces.iter().map(&value).sum::<f64>() / count;
        }
        self.surfaces
            .iter()
            .zip(&self.areas)
            .map(|(surface, area)| value(surface) * area)
            .sum::<f64>()
            / total
    }

    pub fn top_edge_depth(&self) -> f64 {
        self.area_weighted(Surface::top_edge_depth)
    }

    pub fn dip(&self) -> f64 {
        self.area_weighted(Surface::dip)
    }

    pub fn width(&self) -> f64 {
        self.area_weighted(Surface::width)
    }

    /// Circular mean of the member strikes weighted by area.
    pub fn strike(&self) -> f64 {
        let sin = self.area_weighted(|surface| surface.strike().to_radians().sin());
        let cos = self.area_weighted(|surface| surface.strike().to_radians().cos());
        sin.atan2(cos).to_degrees().rem_euclid(360.0)
    }

    pub fn min_distance(&self, point: &Point) -> f64 {
        self.surfaces
            .iter()
            .map(|surface| surface.min_distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn joyner_boore_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        Ok(self.closest_member(lon, lat)?.1)
    }

    fn closest_member(&self, lon: f64, lat: f64) -> GeoResult<(&Surface, f64)> {
        let mut best: Option<(&Surface, f64)> = None;
        for surface in &self.surfaces {
            let rjb = surface.joyner_boore_distance(lon, lat)?;
            if best.is_none_or(|(_, current)| rjb < current) {
                best = Some((surface, rjb));
            }
        }
        best.ok_or_else(|| GeoError::InvalidMesh("multi surface has no members".to_string()))
    }

    pub fn rx_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        self.closest_member(lon, lat)?.0.rx_distance(lon, lat)
    }

    pub fn ry0_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        self.closest_member(lon, lat)?.0.ry0_distance(lon, lat)
    }

    /// Middle point of the largest member.
    pub fn middle_point(&self) -> Point {
        let largest = self
            .areas
            .iter()
            .enumerate()
            .max_by(|lhs, rhs| lhs.1.total_cmp(rhs.1))
            .map_or(0, |(index, _)| index);
        self.surfaces[largest].middle_point()
    }

    pub fn bounding_box(&self) -> GeoResult<SphericalBoundingBox> {
        let mut lons = Vec::with_capacity(self.surfaces.len() * 2);
        let mut lats = Vec::with_capacity(self.surfaces.len() * 2);
        for surface in &self.surfaces {
            let bbox = surface.bounding_box()?;
            lons.extend([bbox.west, bbox.east]);
            lats.extend([bbox.north, bbox.south]);
        }
        spherical_bounding_box(&lons, &lats)
    }
}
