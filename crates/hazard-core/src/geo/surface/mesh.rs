use crate::geo::{GeoError, GeoResult, Line, Point, RectangularMesh};

/// Surface described by a rectangular mesh, with strike and dip fixed at
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSurface {
    mesh: RectangularMesh,
    strike: f64,
    dip: f64,
}

impl MeshSurface {
    pub fn new(mesh: RectangularMesh) -> Self {
        let strike = mesh.strike();
        let dip = mesh.dip();
        Self { mesh, strike, dip }
    }

    pub fn with_orientation(mesh: RectangularMesh, strike: f64, dip: f64) -> Self {
        Self { mesh, strike, dip }
    }

    pub fn mesh(&self) -> &RectangularMesh {
        &self.mesh
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    /// Surface over a window of this mesh, keeping the orientation.
    pub fn window(
        &self,
        row: usize,
        column: usize,
        num_rows: usize,
        num_columns: usize,
    ) -> GeoResult<Self> {
        Ok(Self {
            mesh: self.mesh.submesh(row, column, num_rows, num_columns)?,
            strike: self.strike,
            dip: self.dip,
        })
    }
}

fn check_spacing(mesh_spacing: f64) -> GeoResult<()> {
    if mesh_spacing > 0.0 {
        Ok(())
    } else {
        Err(GeoError::InvalidFaultGeometry(
            "mesh spacing must be positive".to_string(),
        ))
    }
}

/// Fault defined by a surface trace projected down-dip between the
/// seismogenic depths.
pub struct SimpleFaultSurface;

impl SimpleFaultSurface {
    pub fn check_fault_data(
        trace: &Line,
        upper_seismogenic_depth: f64,
        lower_seismogenic_depth: f64,
        dip: f64,
        mesh_spacing: f64,
    ) -> GeoResult<()> {
        if trace.points().iter().any(|point| point.depth != 0.0) {
            return Err(GeoError::InvalidFaultGeometry(
                "fault trace must be horizontal".to_string(),
            ));
        }
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(GeoError::InvalidFaultGeometry(format!(
                "dip must be between 0.0 (exclusive) and 90.0 (inclusive), got {dip}"
            )));
        }
        if upper_seismogenic_depth < 0.0 {
            return Err(GeoError::InvalidFaultGeometry(
                "upper seismogenic depth must be greater than or equal to 0.0".to_string(),
            ));
        }
        if lower_seismogenic_depth <= upper_seismogenic_depth {
            return Err(GeoError::InvalidFaultGeometry(
                "lower seismogenic depth must be below upper seismogenic depth".to_string(),
            ));
        }
        check_spacing(mesh_spacing)
    }

    pub fn from_fault_data(
        trace: &Line,
        upper_seismogenic_depth: f64,
        lower_seismogenic_depth: f64,
        dip: f64,
        mesh_spacing: f64,
    ) -> GeoResult<MeshSurface> {
        Self::check_fault_data(
            trace,
            upper_seismogenic_depth,
            lower_seismogenic_depth,
            dip,
            mesh_spacing,
        )?;
        let tan_dip = dip.to_radians().tan();
        let hdist_top = upper_seismogenic_depth / tan_dip;
        let hdist_bottom = lower_seismogenic_depth / tan_dip;
        let strike = trace.first().azimuth(&trace.last());
        let down_dip = (strike + 90.0).rem_euclid(360.0);

        let columns: Vec<Vec<Point>> = trace
            .resample(mesh_spacing)
            .points()
            .iter()
            .map(|point| {
                let top = point.point_at(hdist_top, upper_seismogenic_depth, down_dip);
                let bottom = point.point_at(hdist_bottom, lower_seismogenic_depth, down_dip);
                top.equally_spaced_points(&bottom, mesh_spacing)
            })
            .collect();
        let mesh = RectangularMesh::from_rows(&transpose(columns)?)?;
        Ok(MeshSurface::with_orientation(mesh, strike, dip))
    }
}

/// Fault defined by a sequence of edges from the top to the bottom.
pub struct ComplexFaultSurface;

impl ComplexFaultSurface {
    pub fn from_edges(edges: &[Line], mesh_spacing: f64) -> GeoResult<MeshSurface> {
        check_spacing(mesh_spacing)?;
        if edges.len() < 2 {
            return Err(GeoError::InvalidFaultGeometry(
                "complex fault geometry requires at least two edges".to_string(),
            ));
        }
        let mean_length = edges.iter().map(Line::length).sum::<f64>() / edges.len() as f64;
        let num_columns = ((mean_length / mesh_spacing).round() as usize).max(1) + 1;
        let edges = edges
            .iter()
            .map(|edge| edge.resample_to_num_points(num_columns))
            .collect::<GeoResult<Vec<_>>>()?;

        let paths = (0..num_columns)
            .map(|column| Line::new(edges.iter().map(|edge| edge.points()[column]).collect()))
            .collect::<GeoResult<Vec<_>>>()?;
        let mean_width = paths.iter().map(Line::length).sum::<f64>() / paths.len() as f64;
        let num_rows = ((mean_width / mesh_spacing).round() as usize).max(1) + 1;
        let columns = paths
            .iter()
            .map(|path| {
                path.resample_to_num_points(num_rows)
                    .map(|line| line.points().to_vec())
            })
            .collect::<GeoResult<Vec<_>>>()?;
        Ok(MeshSurface::new(RectangularMesh::from_rows(&transpose(
            columns,
        )?)?))
    }
}

fn transpose(columns: Vec<Vec<Point>>) -> GeoResult<Vec<Vec<Point>>> {
    let num_rows = columns.first().map_or(0, Vec::len);
    if columns.iter().any(|column| column.len() != num_rows) {
        return Err(GeoError::InvalidMesh(
            "fault columns have different numbers of down-dip points".to_string(),
        ));
    }
    Ok((0..num_rows)
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{ComplexFaultSurface, SimpleFaultSurface};
    use crate::geo::{Line, Point};

    fn trace() -> Line {
        Line::new(vec![Point::surface(0.0, 0.0), Point::surface(0.0, 0.1)]).expect("trace")
    }

    #[test]
    fn simple_fault_validation() {
        assert!(SimpleFaultSurface::from_fault_data(&trace(), 0.0, 10.0, 0.0, 1.0).is_err());
        assert!(SimpleFaultSurface::from_fault_data(&trace(), 10.0, 5.0, 45.0, 1.0).is_err());
        assert!(SimpleFaultSurface::from_fault_data(&trace(), 0.0, 10.0, 45.0, 0.0).is_err());
        let deep = Line::new(vec![Point::new(0.0, 0.0, 1.0), Point::new(0.0, 0.1, 1.0)])
            .expect("trace");
        assert!(SimpleFaultSurface::from_fault_data(&deep, 0.0, 10.0, 45.0, 1.0).is_err());
    }

    #[test]
    fn vertical_simple_fault_mesh() {
        let surface =
            SimpleFaultSurface::from_fault_data(&trace(), 0.0, 10.0, 90.0, 1.0).expect("surface");
        let mesh = surface.mesh();
        assert_eq!(mesh.rows(), 11);
        assert_eq!(mesh.columns(), 12);
        assert_eq!(mesh.top_edge_depth(), 0.0);
        assert!((mesh.get(10, 0).depth - 10.0).abs() < 1.0e-9);
        assert_eq!(surface.dip(), 90.0);
        assert!(surface.strike().abs() < 1.0e-9);
    }

    #[test]
    fn dipping_simple_fault_moves_down_dip_to_the_right() {
        let surface =
            SimpleFaultSurface::from_fault_data(&trace(), 2.0, 12.0, 45.0, 1.0).expect("surface");
        let mesh = surface.mesh();
        let top = mesh.get(0, 0);
        let bottom = mesh.get(mesh.rows() - 1, 0);
        assert!((top.depth - 2.0).abs() < 1.0e-9);
        assert!(bottom.lon > top.lon);
        assert!((mesh.dip() - 45.0).abs() < 1.0);
    }

    #[test]
    fn complex_fault_connects_edges() {
        let top = Line::new(vec![Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.1, 0.0)])
            .expect("top");
        let bottom = Line::new(vec![Point::new(0.1, 0.0, 10.0), Point::new(0.1, 0.1, 10.0)])
            .expect("bottom");
        let surface = ComplexFaultSurface::from_edges(&[top, bottom], 2.0).expect("surface");
        let mesh = surface.mesh();
        assert_eq!(mesh.get(0, 0), Point::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.get(mesh.rows() - 1, mesh.columns() - 1), Point::new(0.1, 0.1, 10.0));
        assert!((surface.dip() - 42.0).abs() < 2.0, "{}", surface.dip());
        assert!(ComplexFaultSurface::from_edges(&[trace()], 1.0).is_err());
    }
}
