//! Seismic sources and the ruptures they generate.
//!
//! [`SourceKind`] is a closed set of source types. Every call to
//! [`Source::iter_ruptures`] builds a fresh rupture stream from the
//! immutable source description, so the same source can be iterated any
//! number of times.

mod fault;
mod group;
mod nonparametric;
mod point;
mod rupture;
mod surface_spec;

pub use fault::{CharacteristicSource, ComplexFaultSource, SimpleFaultSource};
pub use group::SourceGroup;
pub use nonparametric::{
    MultiFaultOccurrence, MultiFaultRupture, MultiFaultSource, NonParametricRupture,
    NonParametricSource,
};
pub use point::{AreaSource, PointRuptureParameters, PointSource};
pub use rupture::{NodalPlane, Rupture};
pub use surface_spec::SurfaceSpec;

use crate::common::constants::DEFAULT_INVESTIGATION_TIME;
use crate::domain::{ComputeResult, ConfigResult, HazardError, HazardResult};
use crate::geo::{GeoError, GeoResult};
use crate::mfd::MfdError;
use crate::site::SiteCollection;
use crate::tom::TemporalOccurrenceModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("rupture mesh spacing must be positive, got {0}")]
    MeshSpacing(f64),
    #[error(
        "upper seismogenic depth must be greater than the maximum elevation on Earth's surface (-8.848 km), got {0}"
    )]
    UpperSeismogenicDepth(f64),
    #[error("lower seismogenic depth must be below upper seismogenic depth")]
    SeismogenicLayer,
    #[error("depths of all hypocenters must be in between lower and upper seismogenic depths, got {0}")]
    HypocenterDepth(f64),
    #[error("rupture aspect ratio must be positive, got {0}")]
    AspectRatio(f64),
    #[error("nodal plane dip must be between 0.0 (exclusive) and 90.0 (inclusive), got {0}")]
    Dip(f64),
    #[error("rake must be between -180.0 and 180.0, got {0}")]
    Rake(f64),
    #[error("source must define at least one rupture")]
    NoRuptures,
    #[error("rupture weight must be between 0 and 1, got {0}")]
    RuptureWeight(f64),
    #[error("section index {index} is out of range for {num_sections} sections")]
    SectionIndex { index: usize, num_sections: usize },
    #[error("occurrence rate must be non-negative, got {0}")]
    OccurrenceRate(f64),
    #[error("source weight must be non-negative, got {0}")]
    Weight(f64),
    #[error(transparent)]
    Mfd(#[from] MfdError),
    #[error(transparent)]
    Geometry(#[from] GeoError),
}

pub type RuptureIter<'a> = Box<dyn Iterator<Item = HazardResult<Rupture>> + 'a>;

fn boxed<'a, I>(ruptures: GeoResult<I>) -> RuptureIter<'a>
where
    I: Iterator<Item = HazardResult<Rupture>> + 'a,
{
    match ruptures {
        Ok(ruptures) => Box::new(ruptures),
        Err(error) => Box::new(std::iter::once(Err(error.into()))),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceKind {
    Point(PointSource),
    Area(AreaSource),
    SimpleFault(SimpleFaultSource),
    ComplexFault(ComplexFaultSource),
    Characteristic(CharacteristicSource),
    NonParametric(NonParametricSource),
    MultiFault(MultiFaultSource),
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::Area(_) => "area",
            Self::SimpleFault(_) => "simpleFault",
            Self::ComplexFault(_) => "complexFault",
            Self::Characteristic(_) => "characteristic",
            Self::NonParametric(_) => "nonParametric",
            Self::MultiFault(_) => "multiFault",
        }
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        match self {
            Self::Point(source) => source.validate(),
            Self::Area(source) => source.validate(),
            Self::SimpleFault(source) => source.validate(),
            Self::ComplexFault(source) => source.validate(),
            Self::Characteristic(source) => source.validate(),
            Self::NonParametric(source) => source.validate(),
            Self::MultiFault(source) => source.validate(),
        }
    }

    pub fn count_ruptures(&self) -> GeoResult<usize> {
        Ok(match self {
            Self::Point(source) => source.count_ruptures(),
            Self::Area(source) => source.count_ruptures()?,
            Self::SimpleFault(source) => source
                .floating()
                .count(&source.surface()?, &source.mfd.annual_occurrence_rates()),
            Self::ComplexFault(source) => source
                .floating()
                .count(&source.surface()?, &source.mfd.annual_occurrence_rates()),
            Self::Characteristic(source) => source.mfd.annual_occurrence_rates().len(),
            Self::NonParametric(source) => source.count_ruptures(),
            Self::MultiFault(source) => source.count_ruptures(),
        })
    }

    pub fn iter_ruptures<'a>(
        &'a self,
        tectonic_region_type: &'a str,
        tom: TemporalOccurrenceModel,
    ) -> RuptureIter<'a> {
        match self {
            Self::Point(source) => Box::new(source.iter_ruptures(tectonic_region_type, tom)),
            Self::Area(source) => boxed(source.iter_ruptures(tectonic_region_type, tom)),
            Self::SimpleFault(source) => boxed(source.surface().map(|surface| {
                source.floating().ruptures(
                    surface,
                    source.mfd.annual_occurrence_rates(),
                    tectonic_region_type,
                    tom,
                )
            })),
            Self::ComplexFault(source) => boxed(source.surface().map(|surface| {
                source.floating().ruptures(
                    surface,
                    source.mfd.annual_occurrence_rates(),
                    tectonic_region_type,
                    tom,
                )
            })),
            Self::Characteristic(source) => {
                boxed(source.iter_ruptures(tectonic_region_type, tom))
            }
            Self::NonParametric(source) => Box::new(source.iter_ruptures(tectonic_region_type)),
            Self::MultiFault(source) => boxed(source.iter_ruptures(tectonic_region_type, tom)),
        }
    }

    /// Lower bound of the Joyner-Boore distance from any rupture of the
    /// source to each site.
    pub fn envelope_distance(&self, sites: &SiteCollection) -> GeoResult<Vec<f64>> {
        match self {
            Self::Point(source) => Ok(source.envelope_distance(sites)),
            Self::Area(source) => source.envelope_distance(sites),
            Self::SimpleFault(source) => fault::fault_envelope(&source.surface()?, sites),
            Self::ComplexFault(source) => fault::fault_envelope(&source.surface()?, sites),
            Self::Characteristic(source) => {
                let surface = source.surface.build()?;
                sites
                    .locations()
                    .map(|site| -> GeoResult<f64> {
                        let rjb = surface.joyner_boore_distance(site.lon, site.lat)?;
                        Ok((rjb - crate::common::constants::DISTANCE_TOLERANCE_KM).max(0.0))
                    })
                    .collect()
            }
            Self::NonParametric(source) => source.envelope_distance(sites),
            Self::MultiFault(source) => source.envelope_distance(sites),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceRecord {
    source_id: String,
    #[serde(default)]
    name: String,
    tectonic_region_type: String,
    #[serde(default)]
    temporal_occurrence_model: Option<TemporalOccurrenceModel>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(flatten)]
    kind: SourceKind,
}

impl TryFrom<SourceRecord> for Source {
    type Error = HazardError;

    fn try_from(record: SourceRecord) -> Result<Self, Self::Error> {
        let mut source = Source::new(
            record.source_id,
            record.name,
            record.tectonic_region_type,
            record.kind,
        )?;
        if let Some(tom) = record.temporal_occurrence_model {
            source = source.with_temporal_occurrence_model(tom)?;
        }
        if let Some(weight) = record.weight {
            source = source.with_weight(weight)?;
        }
        Ok(source)
    }
}

/// A validated seismic source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SourceRecord")]
pub struct Source {
    source_id: String,
    name: String,
    tectonic_region_type: String,
    kind: SourceKind,
    temporal_occurrence_model: Option<TemporalOccurrenceModel>,
    weight: Option<f64>,
    num_ruptures: usize,
}

impl Source {
    pub fn new(
        source_id: impl Into<String>,
        name: impl Into<String>,
        tectonic_region_type: impl Into<String>,
        kind: SourceKind,
    ) -> ConfigResult<Self> {
        let source_id = source_id.into();
        let invalid = |error: SourceError| {
            HazardError::configuration(
                "CONFIG.SOURCE",
                format!("invalid {} source id={source_id}: {error}", kind.name()),
            )
        };
        kind.validate().map_err(invalid)?;
        let num_ruptures = kind
            .count_ruptures()
            .map_err(|error| invalid(error.into()))?;
        Ok(Self {
            source_id,
            name: name.into(),
            tectonic_region_type: tectonic_region_type.into(),
            kind,
            temporal_occurrence_model: None,
            weight: None,
            num_ruptures,
        })
    }

    pub fn with_temporal_occurrence_model(
        mut self,
        tom: TemporalOccurrenceModel,
    ) -> ConfigResult<Self> {
        tom.validate()?;
        self.temporal_occurrence_model = Some(tom);
        Ok(self)
    }

    /// Fills in the occurrence model when the source does not define one.
    pub fn with_default_temporal_occurrence_model(
        mut self,
        tom: TemporalOccurrenceModel,
    ) -> Self {
        self.temporal_occurrence_model.get_or_insert(tom);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> ConfigResult<Self> {
        if !(weight >= 0.0) {
            return Err(HazardError::configuration(
                "CONFIG.SOURCE",
                format!("source id={}: {}", self.source_id, SourceError::Weight(weight)),
            ));
        }
        self.weight = Some(weight);
        Ok(self)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tectonic_region_type(&self) -> &str {
        &self.tectonic_region_type
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn temporal_occurrence_model(&self) -> TemporalOccurrenceModel {
        self.temporal_occurrence_model
            .unwrap_or(TemporalOccurrenceModel::Poisson {
                time_span: DEFAULT_INVESTIGATION_TIME,
            })
    }

    /// Load-balancing weight: the explicit weight, or the rupture count.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(self.num_ruptures as f64)
    }

    pub fn count_ruptures(&self) -> usize {
        self.num_ruptures
    }

    pub fn iter_ruptures(&self) -> RuptureIter<'_> {
        self.kind
            .iter_ruptures(&self.tectonic_region_type, self.temporal_occurrence_model())
    }

    pub fn envelope_distance(&self, sites: &SiteCollection) -> ComputeResult<Vec<f64>> {
        self.kind
            .envelope_distance(sites)
            .map_err(|error| HazardError::in_source(&self.source_id, None, error.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Source, SourceKind};
    use crate::domain::HazardErrorCategory;
    use crate::tom::TemporalOccurrenceModel;

    const POINT_SOURCE: &str = r#"{
        "kind": "point",
        "sourceId": "pt-1",
        "name": "single point",
        "tectonicRegionType": "Active Shallow Crust",
        "location": {"lon": 0.0, "lat": 0.0},
        "mfd": {"kind": "truncatedGr", "aVal": 2.0, "bVal": 1.0,
                "minMag": 5.0, "maxMag": 6.0, "binWidth": 0.5},
        "magnitudeScalingRelationship": "PeerMSR",
        "ruptureAspectRatio": 1.0,
        "upperSeismogenicDepth": 2.0,
        "lowerSeismogenicDepth": 16.0,
        "nodalPlaneDistribution": [[0.5, {"strike": 0, "dip": 90, "rake": 0}],
                                   [0.5, {"strike": 90, "dip": 45, "rake": 90}]],
        "hypocenterDistribution": [[1.0, 8]],
        "ruptureMeshSpacing": 1.0
    }"#;

    #[test]
    fn sources_deserialize_and_validate() {
        let source: Source = serde_json::from_str(POINT_SOURCE).expect("point source");
        assert_eq!(source.source_id(), "pt-1");
        assert!(matches!(source.kind(), SourceKind::Point(_)));
        assert_eq!(source.count_ruptures(), 4);
        assert_eq!(source.weight(), 4.0);
        assert_eq!(
            source.temporal_occurrence_model(),
            TemporalOccurrenceModel::Poisson { time_span: 50.0 }
        );
    }

    #[test]
    fn rupture_iteration_is_restartable() {
        let source: Source = serde_json::from_str(POINT_SOURCE).expect("point source");
        let first: Vec<_> = source
            .iter_ruptures()
            .collect::<Result<_, _>>()
            .expect("first pass");
        let second: Vec<_> = source
            .iter_ruptures()
            .collect::<Result<_, _>>()
            .expect("second pass");
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert!(first
            .iter()
            .all(|rupture| rupture.tectonic_region_type() == "Active Shallow Crust"));
    }

    #[test]
    fn invalid_sources_name_the_source_id() {
        let broken = POINT_SOURCE.replace("\"lowerSeismogenicDepth\": 16.0", "\"lowerSeismogenicDepth\": 1.0");
        let error = serde_json::from_str::<Source>(&broken).expect_err("invalid layer");
        assert!(error.to_string().contains("pt-1"));

        let source: Source = serde_json::from_str(POINT_SOURCE).expect("point source");
        let error = source.with_weight(-1.0).expect_err("negative weight");
        assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
    }

    #[test]
    fn default_occurrence_model_only_fills_gaps() {
        let source: Source = serde_json::from_str(POINT_SOURCE).expect("point source");
        let one_year = TemporalOccurrenceModel::Poisson { time_span: 1.0 };
        let source = source.with_default_temporal_occurrence_model(one_year);
        assert_eq!(source.temporal_occurrence_model(), one_year);
        let ten_years = TemporalOccurrenceModel::Poisson { time_span: 10.0 };
        let source = source.with_default_temporal_occurrence_model(ten_years);
        assert_eq!(source.temporal_occurrence_model(), one_year);
    }
}
