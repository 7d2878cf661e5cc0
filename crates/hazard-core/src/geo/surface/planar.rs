use crate::geo::mesh::{ry0_between, spherical_to_cartesian};
use crate::geo::{
    GeoError, GeoResult, Point, RectangularMesh, SphericalBoundingBox, distance_to_arc,
    spherical_bounding_box,
};
use crate::numerics::{cross3, dot3, norm3, normalized3, sub3};

/// Rectangular plane defined by four corners. The top edge runs from
/// `top_left` to `top_right` along strike; the plane dips to the right.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarSurface {
    strike: f64,
    dip: f64,
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    bottom_right: Point,
    normal: [f64; 3],
    plane_d: f64,
    uv1: [f64; 3],
    uv2: [f64; 3],
    origin: [f64; 3],
    length: f64,
    width: f64,
}

impl PlanarSurface {
    pub fn from_corners(
        strike: f64,
        dip: f64,
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> GeoResult<Self> {
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(GeoError::InvalidFaultGeometry(format!(
                "dip must be between 0.0 (exclusive) and 90.0 (inclusive), got {dip}"
            )));
        }
        if top_left.depth != top_right.depth || bottom_left.depth != bottom_right.depth {
            return Err(GeoError::InvalidFaultGeometry(
                "corners of the same edge must share a depth".to_string(),
            ));
        }
        let tl = spherical_to_cartesian(&top_left);
        let tr = spherical_to_cartesian(&top_right);
        let bl = spherical_to_cartesian(&bottom_left);
        let length = norm3(sub3(tr, tl));
        let width = norm3(sub3(bl, tl));
        if length == 0.0 || width == 0.0 {
            return Err(GeoError::InvalidFaultGeometry(
                "planar surface cannot be degenerate".to_string(),
            ));
        }
        let normal = normalized3(cross3(sub3(tl, tr), sub3(tl, bl)));
        let uv1 = normalized3(sub3(tr, tl));
        let uv2 = cross3(normal, uv1);
        Ok(Self {
            strike,
            dip,
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            normal,
            plane_d: -dot3(normal, tl),
            uv1,
            uv2,
            origin: tl,
            length,
            width,
        })
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    pub fn top_edge_depth(&self) -> f64 {
        self.top_left.depth
    }

    /// Distance to the plane, then along-strike and down-dip offsets
    /// measured from the top-left corner.
    fn project(&self, point: &Point) -> (f64, f64, f64) {
        let xyz = spherical_to_cartesian(point);
        let offset = sub3(xyz, self.origin);
        (
            dot3(self.normal, xyz) + self.plane_d,
            dot3(offset, self.uv1),
            dot3(offset, self.uv2),
        )
    }

    pub fn min_distance(&self, point: &Point) -> f64 {
        let (dist, xx, yy) = self.project(point);
        let mxx = if xx < 0.0 {
            xx
        } else if xx > self.length {
            xx - self.length
        } else {
            0.0
        };
        let myy = if yy < 0.0 {
            yy
        } else if yy > self.width {
            yy - self.width
        } else {
            0.0
        };
        (dist * dist + mxx * mxx + myy * myy).sqrt()
    }

    pub fn mesh(&self) -> GeoResult<RectangularMesh> {
        RectangularMesh::from_rows(&[
            vec![self.top_left, self.top_right],
            vec![self.bottom_left, self.bottom_right],
        ])
    }

    pub fn joyner_boore_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        self.mesh()?.joyner_boore_distance(lon, lat)
    }

    pub fn rx_distance(&self, lon: f64, lat: f64) -> f64 {
        distance_to_arc(
            self.top_left.lon,
            self.top_left.lat,
            self.strike,
            lon,
            lat,
        )
    }

    pub fn ry0_distance(&self, lon: f64, lat: f64) -> f64 {
        ry0_between(self.top_left, self.top_right, self.strike, lon, lat)
    }

    pub fn middle_point(&self) -> Point {
        let top = self.top_left.middle_point(&self.top_right);
        let bottom = self.bottom_left.middle_point(&self.bottom_right);
        top.middle_point(&bottom)
    }

    pub fn bounding_box(&self) -> GeoResult<SphericalBoundingBox> {
        let corners = self.corners();
        let lons: Vec<f64> = corners.iter().map(|point| point.lon).collect();
        let lats: Vec<f64> = corners.iter().map(|point| point.lat).collect();
        spherical_bounding_box(&lons, &lats)
    }
}
