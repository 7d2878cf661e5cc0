//! Fault sources: floating ruptures over simple and complex fault meshes,
//! and characteristic sources rupturing a whole given surface.

use super::{Rupture, SourceError, SurfaceSpec};
use crate::common::constants::DISTANCE_TOLERANCE_KM;
use crate::domain::HazardResult;
use crate::geo::{ComplexFaultSurface, GeoResult, Line, MeshSurface, SimpleFaultSurface};
use crate::mfd::Mfd;
use crate::scalerel::ScalingRelationship;
use crate::site::SiteCollection;
use crate::tom::{Occurrence, TemporalOccurrenceModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn check_rake(rake: f64) -> Result<(), SourceError> {
    if (-180.0..=180.0).contains(&rake) {
        Ok(())
    } else {
        Err(SourceError::Rake(rake))
    }
}

fn check_aspect_ratio(aspect_ratio: f64) -> Result<(), SourceError> {
    if aspect_ratio > 0.0 {
        Ok(())
    } else {
        Err(SourceError::AspectRatio(aspect_ratio))
    }
}

/// How ruptures of a given size float over a fault mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FloatingRuptures {
    pub magnitude_scaling_relationship: ScalingRelationship,
    pub rupture_aspect_ratio: f64,
    pub rupture_mesh_spacing: f64,
    pub rake: f64,
}

impl FloatingRuptures {
    /// Rupture window (rows, columns) for `mag` on a mesh of `shape`.
    fn window(&self, mag: f64, (mesh_rows, mesh_columns): (usize, usize)) -> (usize, usize) {
        let spacing = self.rupture_mesh_spacing;
        let fault_length = (mesh_columns - 1) as f64 * spacing;
        let fault_width = (mesh_rows - 1) as f64 * spacing;
        let area = self
            .magnitude_scaling_relationship
            .median_area(mag, Some(self.rake));
        let mut length = (area * self.rupture_aspect_ratio).sqrt();
        let mut width = area / length;
        if width > fault_width {
            width = fault_width;
            length = area / width;
        }
        length = length.min(fault_length);
        let columns = ((length / spacing).round() as usize + 1).min(mesh_columns);
        let rows = ((width / spacing).round() as usize + 1).min(mesh_rows);
        (rows, columns)
    }

    fn num_positions(&self, mag: f64, shape: (usize, usize)) -> usize {
        let (rows, columns) = self.window(mag, shape);
        (shape.0 - rows + 1) * (shape.1 - columns + 1)
    }

    pub(crate) fn count(&self, surface: &MeshSurface, rates: &[(f64, f64)]) -> usize {
        let shape = surface.mesh().shape();
        rates
            .iter()
            .map(|(mag, _)| self.num_positions(*mag, shape))
            .sum()
    }

    pub(crate) fn ruptures<'a>(
        self,
        surface: MeshSurface,
        rates: Vec<(f64, f64)>,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> impl Iterator<Item = HazardResult<Rupture>> + 'a {
        let shape = surface.mesh().shape();
        let surface = Arc::new(surface);
        rates.into_iter().flat_map(move |(mag, mag_rate)| {
            let (rows, columns) = self.window(mag, shape);
            let row_positions = shape.0 - rows + 1;
            let column_positions = shape.1 - columns + 1;
            let rate = mag_rate / (row_positions * column_positions) as f64;
            let surface = Arc::clone(&surface);
            (0..row_positions).flat_map(move |row| {
                let surface = Arc::clone(&surface);
                (0..column_positions).map(move |column| -> HazardResult<Rupture> {
                    let window = surface.window(row, column, rows, columns)?;
                    let hypocenter = window.mesh().middle_point();
                    Ok(Rupture::new(
                        mag,
                        self.rake,
                        tectonic_region_type,
                        hypocenter,
                        window.into(),
                        Occurrence::Parametric { rate, tom },
                    ))
                })
            })
        })
    }
}

pub(crate) fn fault_envelope(
    surface: &MeshSurface,
    sites: &SiteCollection,
) -> GeoResult<Vec<f64>> {
    sites
        .locations()
        .map(|site| -> GeoResult<f64> {
            let rjb = surface.mesh().joyner_boore_distance(site.lon, site.lat)?;
            Ok((rjb - DISTANCE_TOLERANCE_KM).max(0.0))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleFaultSource {
    pub fault_trace: Line,
    pub upper_seismogenic_depth: f64,
    pub lower_seismogenic_depth: f64,
    pub dip: f64,
    pub rake: f64,
    pub magnitude_scaling_relationship: ScalingRelationship,
    pub rupture_aspect_ratio: f64,
    pub rupture_mesh_spacing: f64,
    pub mfd: Mfd,
}

impl SimpleFaultSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        self.mfd.check_constraints()?;
        check_rake(self.rake)?;
        check_aspect_ratio(self.rupture_aspect_ratio)?;
        SimpleFaultSurface::check_fault_data(
            &self.fault_trace,
            self.upper_seismogenic_depth,
            self.lower_seismogenic_depth,
            self.dip,
            self.rupture_mesh_spacing,
        )?;
        Ok(())
    }

    pub fn surface(&self) -> GeoResult<MeshSurface> {
        SimpleFaultSurface::from_fault_data(
            &self.fault_trace,
            self.upper_seismogenic_depth,
            self.lower_seismogenic_depth,
            self.dip,
            self.rupture_mesh_spacing,
        )
    }

    pub(crate) fn floating(&self) -> FloatingRuptures {
        FloatingRuptures {
            magnitude_scaling_relationship: self.magnitude_scaling_relationship,
            rupture_aspect_ratio: self.rupture_aspect_ratio,
            rupture_mesh_spacing: self.rupture_mesh_spacing,
            rake: self.rake,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexFaultSource {
    pub edges: Vec<Line>,
    pub rake: f64,
    pub magnitude_scaling_relationship: ScalingRelationship,
    pub rupture_aspect_ratio: f64,
    pub rupture_mesh_spacing: f64,
    pub mfd: Mfd,
}

impl ComplexFaultSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        self.mfd.check_constraints()?;
        check_rake(self.rake)?;
        check_aspect_ratio(self.rupture_aspect_ratio)?;
        self.surface()?;
        Ok(())
    }

    pub fn surface(&self) -> GeoResult<MeshSurface> {
        ComplexFaultSurface::from_edges(&self.edges, self.rupture_mesh_spacing)
    }

    pub(crate) fn floating(&self) -> FloatingRuptures {
        FloatingRuptures {
            magnitude_scaling_relationship: self.magnitude_scaling_relationship,
            rupture_aspect_ratio: self.rupture_aspect_ratio,
            rupture_mesh_spacing: self.rupture_mesh_spacing,
            rake: self.rake,
        }
    }
}

/// One rupture per magnitude bin, each covering the whole surface.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacteristicSource {
    pub surface: SurfaceSpec,
    pub rake: f64,
    pub mfd: Mfd,
}

impl CharacteristicSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        self.mfd.check_constraints()?;
        check_rake(self.rake)?;
        self.surface.build()?;
        Ok(())
    }

    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> GeoResult<impl Iterator<Item = HazardResult<Rupture>> + 'a> {
        let surface = self.surface.build()?;
        let hypocenter = surface.middle_point();
        let rates = self.mfd.annual_occurrence_rates();
        Ok(rates.into_iter().map(move |(mag, rate)| {
            Ok(Rupture::new(
                mag,
                self.rake,
                tectonic_region_type,
                hypocenter,
                surface.clone(),
                Occurrence::Parametric { rate, tom },
            ))
        }))
    }
}
