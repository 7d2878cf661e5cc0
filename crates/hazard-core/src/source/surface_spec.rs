use crate::geo::{
    ComplexFaultSurface, GeoResult, Line, PlanarSurface, Point, SimpleFaultSurface, Surface,
};
use serde::{Deserialize, Serialize};

/// Serializable description of a rupture surface, built into a
/// [`Surface`] on demand.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SurfaceSpec {
    #[serde(rename_all = "camelCase")]
    Planar {
        strike: f64,
        dip: f64,
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    },
    #[serde(rename_all = "camelCase")]
    SimpleFault {
        fault_trace: Line,
        upper_seismogenic_depth: f64,
        lower_seismogenic_depth: f64,
        dip: f64,
        mesh_spacing: f64,
    },
    #[serde(rename_all = "camelCase")]
    ComplexFault { edges: Vec<Line>, mesh_spacing: f64 },
}

impl SurfaceSpec {
    pub fn build(&self) -> GeoResult<Surface> {
        match self {
            Self::Planar {
                strike,
                dip,
                top_left,
                top_right,
                bottom_left,
                bottom_right,
            } => Ok(PlanarSurface::from_corners(
                *strike,
                *dip,
                *top_left,
                *top_right,
                *bottom_left,
                *bottom_right,
            )?
            .into()),
            Self::SimpleFault {
                fault_trace,
                upper_seismogenic_depth,
                lower_seismogenic_depth,
                dip,
                mesh_spacing,
            } => Ok(SimpleFaultSurface::from_fault_data(
                fault_trace,
                *upper_seismogenic_depth,
                *lower_seismogenic_depth,
                *dip,
                *mesh_spacing,
            )?
            .into()),
            Self::ComplexFault {
                edges,
                mesh_spacing,
            } => Ok(ComplexFaultSurface::from_edges(edges, *mesh_spacing)?.into()),
        }
    }
}
