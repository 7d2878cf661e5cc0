use super::geodetic::min_distance_to_segment;
use super::projection::OrthographicProjection;
use super::{GeoError, GeoResult, Point};
use serde::{Deserialize, Serialize};

/// Simple polygon on the earth surface. The closing edge is implicit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = GeoError;

    fn try_from(vertices: Vec<Point>) -> GeoResult<Self> {
        Self::new(vertices)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

impl Polygon {
    pub fn new(mut vertices: Vec<Point>) -> GeoResult<Self> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(GeoError::InvalidPolygon(
                "polygon must have at least 3 unique vertices".to_string(),
            ));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn projection(&self) -> GeoResult<(OrthographicProjection, Vec<(f64, f64)>)> {
        let lons: Vec<f64> = self.vertices.iter().map(|point| point.lon).collect();
        let lats: Vec<f64> = self.vertices.iter().map(|point| point.lat).collect();
        let projection = OrthographicProjection::from_lons_lats(&lons, &lats)?;
        let ring = projection.project_all(&lons, &lats)?;
        Ok((projection, ring))
    }

    pub fn contains(&self, lon: f64, lat: f64) -> GeoResult<bool> {
        let (projection, ring) = self.projection()?;
        match projection.project(lon, lat) {
            Ok(xy) => Ok(point_in_ring(&ring, xy)),
            Err(GeoError::ProjectionOutOfRange { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Distance from a point to the polygon, zero for points inside.
    pub fn distance_to(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        if self.contains(lon, lat)? {
            return Ok(0.0);
        }
        let count = self.vertices.len();
        Ok((0..count)
            .map(|index| {
                let start = self.vertices[index];
                let end = self.vertices[(index + 1) % count];
                min_distance_to_segment(start, end, lon, lat).abs()
            })
            .fold(f64::INFINITY, f64::min))
    }

    /// Regular grid of surface points inside the polygon, spaced by
    /// `spacing` km on the projection plane.
    pub fn discretize(&self, spacing: f64) -> GeoResult<Vec<Point>> {
        if spacing <= 0.0 {
            return Err(GeoError::InvalidPolygon(
                "polygon discretization spacing must be positive".to_string(),
            ));
        }
        let (projection, ring) = self.projection()?;
        let min_x = ring.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = ring.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = ring.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = ring.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let columns = ((max_x - min_x) / spacing).floor() as usize + 1;
        let rows = ((max_y - min_y) / spacing).floor() as usize + 1;
        let mut points = Vec::new();
        for row in 0..rows {
            let y = max_y - spacing * row as f64;
            for column in 0..columns {
                let x = min_x + spacing * column as f64;
                if point_in_ring(&ring, (x, y)) {
                    let (lon, lat) = projection.unproject(x, y);
                    points.push(Point::surface(lon, lat));
                }
            }
        }
        if points.is_empty() {
            return Err(GeoError::InvalidPolygon(format!(
                "polygon is too small to be discretized with spacing {spacing} km"
            )));
        }
        Ok(points)
    }
}

/// Even-odd rule on a planar ring. Points on an edge count as inside.
pub(crate) fn point_in_ring(ring: &[(f64, f64)], (x, y): (f64, f64)) -> bool {
    let count = ring.len();
    if count < 3 {
        return false;
    }
    let mut inside = false;
    let mut previous = count - 1;
    for current in 0..count {
        let (xi, yi) = ring[current];
        let (xj, yj) = ring[previous];
        if distance_to_segment_2d((x, y), (xj, yj), (xi, yi)) < 1.0e-9 {
            return true;
        }
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        previous = current;
    }
    inside
}

pub(crate) fn distance_to_segment_2d(
    (px, py): (f64, f64),
    (ax, ay): (f64, f64),
    (bx, by): (f64, f64),
) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{Polygon, distance_to_segment_2d, point_in_ring};
    use crate::geo::Point;

    fn square() -> Polygon {
        Polygon::new(vec![
            Point::surface(0.0, 0.0),
            Point::surface(0.0, 0.2),
            Point::surface(0.2, 0.2),
            Point::surface(0.2, 0.0),
        ])
        .expect("square")
    }

    #[test]
    fn closing_vertex_is_dropped_and_small_rings_rejected() {
        let polygon = Polygon::new(vec![
            Point::surface(0.0, 0.0),
            Point::surface(0.0, 1.0),
            Point::surface(1.0, 1.0),
            Point::surface(0.0, 0.0),
        ])
        .expect("triangle");
        assert_eq!(polygon.vertices().len(), 3);
        assert!(Polygon::new(vec![Point::surface(0.0, 0.0), Point::surface(1.0, 1.0)]).is_err());
    }

    #[test]
    fn contains_and_distance_agree() {
        let polygon = square();
        assert!(polygon.contains(0.1, 0.1).expect("contains"));
        assert!(!polygon.contains(0.3, 0.1).expect("contains"));
        assert_eq!(polygon.distance_to(0.1, 0.1).expect("distance"), 0.0);
        let outside = polygon.distance_to(0.3, 0.1).expect("distance");
        let expected = crate::geo::geodetic_distance(0.2, 0.1, 0.3, 0.1);
        assert!((outside - expected).abs() < 0.05);
    }

    #[test]
    fn discretize_fills_the_interior() {
        let polygon = square();
        let points = polygon.discretize(5.0).expect("grid");
        assert!(points.len() >= 16 && points.len() <= 25, "{}", points.len());
        for point in &points {
            assert!(polygon.contains(point.lon, point.lat).expect("contains"));
        }
        assert!(polygon.discretize(0.0).is_err());
    }

    #[test]
    fn planar_helpers() {
        let ring = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(point_in_ring(&ring, (0.5, 0.5)));
        assert!(point_in_ring(&ring, (1.0, 0.5)));
        assert!(!point_in_ring(&ring, (1.5, 0.5)));
        assert!((distance_to_segment_2d((0.5, 1.0), (0.0, 0.0), (1.0, 0.0)) - 1.0).abs() < 1e-12);
        assert!((distance_to_segment_2d((2.0, 0.0), (0.0, 0.0), (1.0, 0.0)) - 1.0).abs() < 1e-12);
    }
}
