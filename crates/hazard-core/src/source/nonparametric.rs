//! Sources given as explicit rupture lists: non-parametric sources and
//! multi-fault sources built from shared fault sections.

use super::{Rupture, SourceError, SurfaceSpec};
use crate::common::constants::DISTANCE_TOLERANCE_KM;
use crate::domain::HazardResult;
use crate::geo::{GeoResult, MultiSurface, Point, Surface};
use crate::pmf::Pmf;
use crate::site::SiteCollection;
use crate::tom::{Occurrence, TemporalOccurrenceModel};
use serde::{Deserialize, Serialize};

fn check_rake(rake: f64) -> Result<(), SourceError> {
    if (-180.0..=180.0).contains(&rake) {
        Ok(())
    } else {
        Err(SourceError::Rake(rake))
    }
}

fn surfaces_envelope<'a>(
    surfaces: impl Iterator<Item = &'a Surface> + Clone,
    sites: &SiteCollection,
) -> GeoResult<Vec<f64>> {
    sites
        .locations()
        .map(|site| -> GeoResult<f64> {
            let mut closest = f64::INFINITY;
            for surface in surfaces.clone() {
                closest = closest.min(surface.joyner_boore_distance(site.lon, site.lat)?);
            }
            Ok((closest - DISTANCE_TOLERANCE_KM).max(0.0))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonParametricRupture {
    pub mag: f64,
    pub rake: f64,
    pub hypocenter: Point,
    pub surface: SurfaceSpec,
    pub probabilities_of_occurrence: Pmf<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonParametricSource {
    pub ruptures: Vec<NonParametricRupture>,
}

impl NonParametricSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.ruptures.is_empty() {
            return Err(SourceError::NoRuptures);
        }
        for rupture in &self.ruptures {
            check_rake(rupture.rake)?;
            if let Some(weight) = rupture.weight {
                if !(0.0..=1.0).contains(&weight) {
                    return Err(SourceError::RuptureWeight(weight));
                }
            }
            rupture.surface.build()?;
        }
        Ok(())
    }

    pub fn count_ruptures(&self) -> usize {
        self.ruptures.len()
    }

    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
    ) -> impl Iterator<Item = HazardResult<Rupture>> + 'a {
        self.ruptures.iter().map(move |rupture| -> HazardResult<Rupture> {
            Ok(Rupture::new(
                rupture.mag,
                rupture.rake,
                tectonic_region_type,
                rupture.hypocenter,
                rupture.surface.build()?,
                Occurrence::NonParametric(rupture.probabilities_of_occurrence.clone()),
            )
            .with_weight(rupture.weight))
        })
    }

    pub fn envelope_distance(&self, sites: &SiteCollection) -> GeoResult<Vec<f64>> {
        let surfaces = self
            .ruptures
            .iter()
            .map(|rupture| rupture.surface.build())
            .collect::<GeoResult<Vec<_>>>()?;
        surfaces_envelope(surfaces.iter(), sites)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MultiFaultOccurrence {
    Rate(f64),
    Pmf(Pmf<u32>),
}

/// A rupture spanning one or more sections, referenced by index.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFaultRupture {
    pub sections: Vec<usize>,
    pub mag: f64,
    pub rake: f64,
    pub occurrence: MultiFaultOccurrence,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFaultSource {
    pub sections: Vec<SurfaceSpec>,
    pub ruptures: Vec<MultiFaultRupture>,
}

impl MultiFaultSource {
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.ruptures.is_empty() {
            return Err(SourceError::NoRuptures);
        }
        for section in &self.sections {
            section.build()?;
        }
        for rupture in &self.ruptures {
            check_rake(rupture.rake)?;
            if rupture.sections.is_empty() {
                return Err(SourceError::NoRuptures);
            }
            if let Some(index) = rupture
                .sections
                .iter()
                .find(|index| **index >= self.sections.len())
            {
                return Err(SourceError::SectionIndex {
                    index: *index,
                    num_sections: self.sections.len(),
                });
            }
            if let MultiFaultOccurrence::Rate(rate) = rupture.occurrence {
                if !(rate >= 0.0) {
                    return Err(SourceError::OccurrenceRate(rate));
                }
            }
        }
        Ok(())
    }

    pub fn count_ruptures(&self) -> usize {
        self.ruptures.len()
    }

    fn section_surfaces(&self) -> GeoResult<Vec<Surface>> {
        self.sections.iter().map(SurfaceSpec::build).collect()
    }

    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> GeoResult<impl Iterator<Item = HazardResult<Rupture>> + 'a> {
        let sections = self.section_surfaces()?;
        Ok(self.ruptures.iter().map(move |rupture| -> HazardResult<Rupture> {
            let surface = match rupture.sections.as_slice() {
                [single] => sections[*single].clone(),
                indices => MultiSurface::new(
                    indices.iter().map(|index| sections[*index].clone()).collect(),
                )?
                .into(),
            };
            let occurrence = match &rupture.occurrence {
                MultiFaultOccurrence::Rate(rate) => Occurrence::Parametric { rate: *rate, tom },
                MultiFaultOccurrence::Pmf(pmf) => Occurrence::NonParametric(pmf.clone()),
            };
            Ok(Rupture::new(
                rupture.mag,
                rupture.rake,
                tectonic_region_type,
                surface.middle_point(),
                surface,
                occurrence,
            ))
        }))
    }

    pub fn envelope_distance(&self, sites: &SiteCollection) -> GeoResult<Vec<f64>> {
        let sections = self.section_surfaces()?;
        surfaces_envelope(sections.iter(), sites)
    }
}
