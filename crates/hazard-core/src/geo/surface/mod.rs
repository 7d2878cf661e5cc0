//! Rupture surfaces and the distance metrics GSIMs consume.

mod mesh;
mod multi;
mod planar;

pub use mesh::{ComplexFaultSurface, MeshSurface, SimpleFaultSurface};
pub use multi::MultiSurface;
pub use planar::PlanarSurface;

use super::{GeoResult, Point, SphericalBoundingBox};

#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Planar(PlanarSurface),
    Mesh(MeshSurface),
    Multi(MultiSurface),
}

impl From<PlanarSurface> for Surface {
    fn from(surface: PlanarSurface) -> Self {
        Self::Planar(surface)
    }
}

impl From<MeshSurface> for Surface {
    fn from(surface: MeshSurface) -> Self {
        Self::Mesh(surface)
    }
}

impl From<MultiSurface> for Surface {
    fn from(surface: MultiSurface) -> Self {
        Self::Multi(surface)
    }
}

impl Surface {
    /// Closest distance (rrup).
    pub fn min_distance(&self, point: &Point) -> f64 {
        match self {
            Self::Planar(surface) => surface.min_distance(point),
            Self::Mesh(surface) => surface.mesh().min_distance(point),
            Self::Multi(surface) => surface.min_distance(point),
        }
    }

    /// Joyner-Boore distance (rjb).
    pub fn joyner_boore_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        match self {
            Self::Planar(surface) => surface.joyner_boore_distance(lon, lat),
            Self::Mesh(surface) => surface.mesh().joyner_boore_distance(lon, lat),
            Self::Multi(surface) => surface.joyner_boore_distance(lon, lat),
        }
    }

    pub fn rx_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        match self {
            Self::Planar(surface) => Ok(surface.rx_distance(lon, lat)),
            Self::Mesh(surface) => Ok(surface.mesh().rx_distance(lon, lat)),
            Self::Multi(surface) => surface.rx_distance(lon, lat),
        }
    }

    pub fn ry0_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        match self {
            Self::Planar(surface) => Ok(surface.ry0_distance(lon, lat)),
            Self::Mesh(surface) => Ok(surface.mesh().ry0_distance(lon, lat)),
            Self::Multi(surface) => surface.ry0_distance(lon, lat),
        }
    }

    /// Depth to the top of rupture (ztor).
    pub fn top_edge_depth(&self) -> f64 {
        match self {
            Self::Planar(surface) => surface.top_edge_depth(),
            Self::Mesh(surface) => surface.mesh().top_edge_depth(),
            Self::Multi(surface) => surface.top_edge_depth(),
        }
    }

    pub fn strike(&self) -> f64 {
        match self {
            Self::Planar(surface) => surface.strike(),
            Self::Mesh(surface) => surface.strike(),
            Self::Multi(surface) => surface.strike(),
        }
    }

    pub fn dip(&self) -> f64 {
        match self {
            Self::Planar(surface) => surface.dip(),
            Self::Mesh(surface) => surface.dip(),
            Self::Multi(surface) => surface.dip(),
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Self::Planar(surface) => surface.width(),
            Self::Mesh(surface) => surface.mesh().width(),
            Self::Multi(surface) => surface.width(),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Self::Planar(surface) => surface.area(),
            Self::Mesh(surface) => surface.mesh().area(),
            Self::Multi(surface) => surface.area(),
        }
    }

    pub fn middle_point(&self) -> Point {
        match self {
            Self::Planar(surface) => surface.middle_point(),
            Self::Mesh(surface) => surface.mesh().middle_point(),
            Self::Multi(surface) => surface.middle_point(),
        }
    }

    pub fn bounding_box(&self) -> GeoResult<SphericalBoundingBox> {
        match self {
            Self::Planar(surface) => surface.bounding_box(),
            Self::Mesh(surface) => surface.mesh().bounding_box(),
            Self::Multi(surface) => surface.bounding_box(),
        }
    }
}
