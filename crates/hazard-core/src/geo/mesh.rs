use super::geodetic::{distance_to_arc, geodetic_distance, min_distance_to_segment};
use super::polygon::{distance_to_segment_2d, point_in_ring};
use super::projection::{OrthographicProjection, SphericalBoundingBox, spherical_bounding_box};
use super::{GeoError, GeoResult, Line, Point};
use crate::common::constants::{EARTH_RADIUS_KM, JOYNER_BOORE_PROJECTION_THRESHOLD_KM};
use crate::numerics::{cross3, norm3, sub3};
use faer::Mat;

/// Grid of points describing a rupture surface. Rows run down-dip and
/// columns along strike, so row 0 is the top edge.
#[derive(Debug, Clone)]
pub struct RectangularMesh {
    lons: Mat<f64>,
    lats: Mat<f64>,
    depths: Mat<f64>,
}

impl PartialEq for RectangularMesh {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && (0..self.rows()).all(|row| {
                (0..self.columns()).all(|column| self.get(row, column) == other.get(row, column))
            })
    }
}

impl RectangularMesh {
    pub fn from_rows(rows: &[Vec<Point>]) -> GeoResult<Self> {
        let num_rows = rows.len();
        let num_columns = rows.first().map_or(0, Vec::len);
        if num_rows == 0 || num_columns == 0 {
            return Err(GeoError::InvalidMesh("mesh cannot be empty".to_string()));
        }
        if rows.iter().any(|row| row.len() != num_columns) {
            return Err(GeoError::InvalidMesh(
                "mesh rows must all have the same number of points".to_string(),
            ));
        }
        Ok(Self {
            lons: Mat::from_fn(num_rows, num_columns, |row, column| rows[row][column].lon),
            lats: Mat::from_fn(num_rows, num_columns, |row, column| rows[row][column].lat),
            depths: Mat::from_fn(num_rows, num_columns, |row, column| {
                rows[row][column].depth
            }),
        })
    }

    pub fn rows(&self) -> usize {
        self.lons.nrows()
    }

    pub fn columns(&self) -> usize {
        self.lons.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.columns())
    }

    pub fn get(&self, row: usize, column: usize) -> Point {
        Point::new(
            self.lons[(row, column)],
            self.lats[(row, column)],
            self.depths[(row, column)],
        )
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.rows())
            .flat_map(move |row| (0..self.columns()).map(move |column| self.get(row, column)))
    }

    pub fn row(&self, row: usize) -> Vec<Point> {
        (0..self.columns()).map(|column| self.get(row, column)).collect()
    }

    /// Rectangular window `[row, row + num_rows) x [column, column + num_columns)`.
    pub fn submesh(
        &self,
        row: usize,
        column: usize,
        num_rows: usize,
        num_columns: usize,
    ) -> GeoResult<Self> {
        if num_rows == 0
            || num_columns == 0
            || row + num_rows > self.rows()
            || column + num_columns > self.columns()
        {
            return Err(GeoError::InvalidMesh(format!(
                "submesh {num_rows}x{num_columns} at ({row}, {column}) exceeds mesh shape {:?}",
                self.shape()
            )));
        }
        Ok(Self {
            lons: Mat::from_fn(num_rows, num_columns, |i, j| self.lons[(row + i, column + j)]),
            lats: Mat::from_fn(num_rows, num_columns, |i, j| self.lats[(row + i, column + j)]),
            depths: Mat::from_fn(num_rows, num_columns, |i, j| {
                self.depths[(row + i, column + j)]
            }),
        })
    }

    pub fn top_edge_depth(&self) -> f64 {
        (0..self.columns())
            .map(|column| self.depths[(0, column)])
            .fold(f64::INFINITY, f64::min)
    }

    pub fn bounding_box(&self) -> GeoResult<SphericalBoundingBox> {
        let lons: Vec<f64> = self.points().map(|point| point.lon).collect();
        let lats: Vec<f64> = self.points().map(|point| point.lat).collect();
        spherical_bounding_box(&lons, &lats)
    }

    /// Central node, or the middle of the central nodes for even sizes.
    pub fn middle_point(&self) -> Point {
        let (rows, columns) = self.shape();
        let row_middle = |row: usize| -> Point {
            let mid = columns / 2;
            if columns % 2 == 1 {
                self.get(row, mid)
            } else {
                self.get(row, mid - 1).middle_point(&self.get(row, mid))
            }
        };
        let mid = rows / 2;
        if rows % 2 == 1 {
            row_middle(mid)
        } else {
            row_middle(mid - 1).middle_point(&row_middle(mid))
        }
    }

    /// Shortest straight-line distance from any mesh node to the point.
    pub fn min_distance(&self, target: &Point) -> f64 {
        self.points()
            .map(|node| node.distance(target))
            .fold(f64::INFINITY, f64::min)
    }

    fn min_epicentral_distance(&self, lon: f64, lat: f64) -> f64 {
        self.points()
            .map(|node| geodetic_distance(node.lon, node.lat, lon, lat))
            .fold(f64::INFINITY, f64::min)
    }

    /// Shortest distance from the point to the surface projection of the
    /// mesh, zero when the point lies above the mesh. Beyond
    /// `JOYNER_BOORE_PROJECTION_THRESHOLD_KM` the closest node is used.
    pub fn joyner_boore_distance(&self, lon: f64, lat: f64) -> GeoResult<f64> {
        let nearest = self.min_epicentral_distance(lon, lat);
        if nearest >= JOYNER_BOORE_PROJECTION_THRESHOLD_KM || self.points().count() == 1 {
            return Ok(nearest);
        }

        let mut lons: Vec<f64> = self.points().map(|point| point.lon).collect();
        let mut lats: Vec<f64> = self.points().map(|point| point.lat).collect();
        lons.push(lon);
        lats.push(lat);
        let projection = OrthographicProjection::from_lons_lats(&lons, &lats)?;
        let site = projection.project(lon, lat)?;
        let projected = |row: usize, column: usize| {
            projection.project(self.lons[(row, column)], self.lats[(row, column)])
        };

        let (rows, columns) = self.shape();
        if rows == 1 || columns == 1 {
            let nodes = self
                .points()
                .map(|point| projection.project(point.lon, point.lat))
                .collect::<GeoResult<Vec<_>>>()?;
            return Ok(nodes
                .windows(2)
                .map(|pair| distance_to_segment_2d(site, pair[0], pair[1]))
                .fold(f64::INFINITY, f64::min));
        }

        for row in 0..rows - 1 {
            for column in 0..columns - 1 {
                let cell = [
                    projected(row, column)?,
                    projected(row, column + 1)?,
                    projected(row + 1, column + 1)?,
                    projected(row + 1, column)?,
                ];
                if point_in_ring(&cell, site) {
                    return Ok(0.0);
                }
            }
        }

        let outline = self.outline_indices();
        let ring = outline
            .iter()
            .map(|(row, column)| projected(*row, *column))
            .collect::<GeoResult<Vec<_>>>()?;
        let count = ring.len();
        Ok((0..count)
            .map(|index| distance_to_segment_2d(site, ring[index], ring[(index + 1) % count]))
            .fold(f64::INFINITY, f64::min))
    }

    /// Node indices of the mesh perimeter, clockwise from the top-left corner.
    fn outline_indices(&self) -> Vec<(usize, usize)> {
        let (rows, columns) = self.shape();
        let mut outline = Vec::with_capacity(2 * (rows + columns));
        outline.extend((0..columns).map(|column| (0, column)));
        outline.extend((1..rows).map(|row| (row, columns - 1)));
        outline.extend((0..columns - 1).rev().map(|column| (rows - 1, column)));
        outline.extend((1..rows - 1).rev().map(|row| (row, 0)));
        outline
    }

    pub fn top_edge(&self) -> GeoResult<Line> {
        let mut points = self.row(0);
        points.dedup();
        Line::new(points)
    }

    /// Signed distance to the extension of the top edge; positive on the
    /// hanging-wall side.
    pub fn rx_distance(&self, lon: f64, lat: f64) -> f64 {
        let top = self.row(0);
        if top.len() < 2 {
            return 0.0;
        }
        let closest = top
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0] != pair[1])
            .map(|(index, pair)| {
                (
                    index,
                    min_distance_to_segment(pair[0], pair[1], lon, lat).abs(),
                )
            })
            .min_by(|lhs, rhs| lhs.1.total_cmp(&rhs.1))
            .map_or(0, |(index, _)| index);
        let start = top[closest];
        let end = top[closest + 1];
        distance_to_arc(start.lon, start.lat, start.azimuth(&end), lon, lat)
    }

    /// Distance beyond the along-strike ends of the top edge; zero when the
    /// site projects between them.
    pub fn ry0_distance(&self, lon: f64, lat: f64) -> f64 {
        let top = self.row(0);
        let first = top[0];
        let last = top[top.len() - 1];
        if first == last {
            return geodetic_distance(first.lon, first.lat, lon, lat);
        }
        ry0_between(first, last, first.azimuth(&last), lon, lat)
    }

    /// Surface areas of each cell in km², computed from two triangles on the
    /// earth-centred cartesian nodes.
    pub fn cell_areas(&self) -> Mat<f64> {
        let (rows, columns) = self.shape();
        if rows < 2 || columns < 2 {
            return Mat::zeros(rows.saturating_sub(1), columns.saturating_sub(1));
        }
        let xyz = |row: usize, column: usize| spherical_to_cartesian(&self.get(row, column));
        Mat::from_fn(rows - 1, columns - 1, |row, column| {
            let top_left = xyz(row, column);
            let top_right = xyz(row, column + 1);
            let bottom_left = xyz(row + 1, column);
            let bottom_right = xyz(row + 1, column + 1);
            let upper = norm3(cross3(
                sub3(top_right, top_left),
                sub3(bottom_left, top_left),
            )) / 2.0;
            let lower = norm3(cross3(
                sub3(bottom_left, bottom_right),
                sub3(top_right, bottom_right),
            )) / 2.0;
            upper + lower
        })
    }

    pub fn area(&self) -> f64 {
        let areas = self.cell_areas();
        let mut total = 0.0;
        for row in 0..areas.nrows() {
            for column in 0..areas.ncols() {
                total += areas[(row, column)];
            }
        }
        total
    }

    /// Mean down-dip extent of the mesh columns.
    pub fn width(&self) -> f64 {
        let (rows, columns) = self.shape();
        if rows < 2 {
            return 0.0;
        }
        let total: f64 = (0..columns)
            .map(|column| {
                (0..rows - 1)
                    .map(|row| self.get(row, column).distance(&self.get(row + 1, column)))
                    .sum::<f64>()
            })
            .sum();
        total / columns as f64
    }

    /// Area-weighted mean dip of the mesh cells, in degrees.
    pub fn dip(&self) -> f64 {
        let (rows, columns) = self.shape();
        if rows < 2 || columns < 2 {
            return 90.0;
        }
        let areas = self.cell_areas();
        let (mut weighted, mut total) = (0.0, 0.0);
        for row in 0..rows - 1 {
            for column in 0..columns - 1 {
                let top = self.get(row, column).middle_point(&self.get(row, column + 1));
                let bottom = self
                    .get(row + 1, column)
                    .middle_point(&self.get(row + 1, column + 1));
                let horizontal = top.epicentral_distance(&bottom);
                let vertical = (bottom.depth - top.depth).abs();
                let dip = vertical.atan2(horizontal).to_degrees();
                weighted += dip * areas[(row, column)];
                total += areas[(row, column)];
            }
        }
        if total > 0.0 { weighted / total } else { 90.0 }
    }

    pub fn strike(&self) -> f64 {
        self.top_edge().map_or(0.0, |line| line.average_azimuth())
    }
}

pub(crate) fn ry0_between(first: Point, last: Point, strike: f64, lon: f64, lat: f64) -> f64 {
    let perpendicular = (strike + 90.0).rem_euclid(360.0);
    let dst1 = distance_to_arc(first.lon, first.lat, perpendicular, lon, lat);
    let dst2 = distance_to_arc(last.lon, last.lat, perpendicular, lon, lat);
    if dst1.signum() == dst2.signum() {
        dst1.abs().min(dst2.abs())
    } else {
        0.0
    }
}

pub(crate) fn spherical_to_cartesian(point: &Point) -> [f64; 3] {
    let radius = EARTH_RADIUS_KM - point.depth;
    let (lon, lat) = (point.lon.to_radians(), point.lat.to_radians());
    [
        radius * lat.cos() * lon.cos(),
        radius * lat.cos() * lon.sin(),
        radius * lat.sin(),
    ]
}

#[cfg(test)]
mod tests {
    use super::RectangularMesh;
    use crate::geo::{Point, geodetic_distance};

    fn vertical_mesh() -> RectangularMesh {
        let rows: Vec<Vec<Point>> = (0..3)
            .map(|row| {
                (0..5)
                    .map(|column| Point::new(0.0, 0.01 * column as f64, row as f64))
                    .collect()
            })
            .collect();
        RectangularMesh::from_rows(&rows).expect("mesh")
    }

    fn flat_mesh() -> RectangularMesh {
        let rows: Vec<Vec<Point>> = (0..3)
            .map(|row| {
                (0..3)
                    .map(|column| Point::new(0.05 * column as f64, -0.05 * row as f64, 5.0))
                    .collect()
            })
            .collect();
        RectangularMesh::from_rows(&rows).expect("mesh")
    }

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![
            vec![Point::surface(0.0, 0.0), Point::surface(0.0, 0.1)],
            vec![Point::surface(0.0, 0.0)],
        ];
        assert!(RectangularMesh::from_rows(&rows).is_err());
        assert!(RectangularMesh::from_rows(&[]).is_err());
    }

    #[test]
    fn middle_point_handles_odd_and_even_shapes() {
        let mesh = vertical_mesh();
        assert_eq!(mesh.middle_point(), Point::new(0.0, 0.02, 1.0));
        let even = mesh.submesh(0, 0, 2, 2).expect("submesh");
        let middle = even.middle_point();
        assert!((middle.lat - 0.005).abs() < 1.0e-9);
        assert!((middle.depth - 0.5).abs() < 1.0e-12);
    }

    #[test]
    fn joyner_boore_distance_is_zero_above_the_mesh() {
        let mesh = flat_mesh();
        assert_eq!(mesh.joyner_boore_distance(0.05, -0.05).expect("rjb"), 0.0);
        let outside = mesh.joyner_boore_distance(0.2, -0.05).expect("rjb");
        let expected = geodetic_distance(0.1, -0.05, 0.2, -0.05);
        assert!((outside - expected).abs() < 0.01, "{outside} vs {expected}");
        let far = mesh.joyner_boore_distance(2.0, -0.05).expect("rjb");
        assert!((far - geodetic_distance(0.1, -0.05, 2.0, -0.05)).abs() < 1.0e-9);
    }

    #[test]
    fn vertical_mesh_geometry() {
        let mesh = vertical_mesh();
        assert_eq!(mesh.top_edge_depth(), 0.0);
        assert!((mesh.dip() - 90.0).abs() < 1.0e-6);
        assert!((mesh.width() - 2.0).abs() < 1.0e-9);
        assert!(mesh.strike().abs() < 1.0e-6);
        let length = geodetic_distance(0.0, 0.0, 0.0, 0.04);
        assert!((mesh.area() - 2.0 * length).abs() < 1.0e-2);
    }

    #[test]
    fn rx_and_ry0_follow_the_top_edge() {
        let mesh = vertical_mesh();
        let east = mesh.rx_distance(0.1, 0.02);
        assert!((east - geodetic_distance(0.0, 0.02, 0.1, 0.02)).abs() < 1.0e-3);
        assert!(mesh.rx_distance(-0.1, 0.02) < 0.0);
        assert_eq!(mesh.ry0_distance(0.1, 0.02), 0.0);
        let beyond = mesh.ry0_distance(0.0, 0.06);
        assert!((beyond - geodetic_distance(0.0, 0.04, 0.0, 0.06)).abs() < 1.0e-3);
    }

    #[test]
    fn min_distance_uses_nodes() {
        let mesh = vertical_mesh();
        let target = Point::new(0.0, 0.0, 10.0);
        assert!((mesh.min_distance(&target) - 8.0).abs() < 1.0e-9);
    }
}
