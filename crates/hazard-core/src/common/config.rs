//! JSON job files and their resolution into a [`ClassicalCalculation`].
//!
//! Parsing only checks shapes; [`JobConfig::resolve`] builds the site
//! collection, resolves GSIM names through a [`GsimRegistry`], groups loose
//! sources by tectonic region type and runs every configuration check before
//! a single rupture is generated.

use crate::calc::ClassicalCalculation;
use crate::common::constants::DEFAULT_INVESTIGATION_TIME;
use crate::domain::{ConfigResult, HazardError};
use crate::filters::IntegrationDistance;
use crate::geo::Point;
use crate::gsim::{Gsim, GsimRegistry};
use crate::imt::Imtls;
use crate::site::{ReferenceSiteParameters, Site, SiteCollection};
use crate::source::{Source, SourceGroup};
use crate::tom::TemporalOccurrenceModel;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vs30Type {
    Measured,
    #[default]
    Inferred,
}

/// One site of the job. Missing soil parameters take the job's reference
/// values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteRecord {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub vs30: Option<f64>,
    #[serde(default)]
    pub vs30measured: Option<bool>,
    #[serde(default)]
    pub z1pt0: Option<f64>,
    #[serde(default)]
    pub z2pt5: Option<f64>,
    #[serde(default)]
    pub backarc: Option<bool>,
}

impl SiteRecord {
    fn to_site(&self, reference: ReferenceSiteParameters) -> ConfigResult<Site> {
        Site::new(
            Point::new(self.lon, self.lat, self.depth),
            self.vs30.unwrap_or(reference.vs30),
            self.vs30measured.unwrap_or(reference.vs30measured),
            self.z1pt0.unwrap_or(reference.z1pt0),
            self.z2pt5.unwrap_or(reference.z2pt5),
            self.backarc.unwrap_or(reference.backarc),
        )
    }
}

/// A single GSIM name or a list of alternatives forming logic-tree branches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GsimSelection {
    One(String),
    Many(Vec<String>),
}

impl GsimSelection {
    pub fn names(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

/// Entry of the source model: a source group, or a loose source that is
/// put in an independent group with the other loose sources of its
/// tectonic region type.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceModelEntry {
    Group(SourceGroup),
    Source(Source),
}

impl<'de> Deserialize<'de> for SourceModelEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let entry = if value.get("sources").is_some() {
            serde_json::from_value(value).map(Self::Group)
        } else {
            serde_json::from_value(value).map(Self::Source)
        };
        entry.map_err(serde::de::Error::custom)
    }
}

fn default_investigation_time() -> f64 {
    DEFAULT_INVESTIGATION_TIME
}

fn default_concurrent_tasks() -> usize {
    rayon::current_num_threads()
}

fn default_reference_vs30() -> f64 {
    ReferenceSiteParameters::default().vs30
}

fn default_reference_z1pt0() -> f64 {
    ReferenceSiteParameters::default().z1pt0
}

fn default_reference_z2pt5() -> f64 {
    ReferenceSiteParameters::default().z2pt5
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    #[serde(default)]
    pub description: String,
    pub sites: Vec<SiteRecord>,
    pub imtls: Imtls,
    pub gsim_by_trt: BTreeMap<String, GsimSelection>,
    #[serde(default)]
    pub truncation_level: Option<f64>,
    pub maximum_distance: IntegrationDistance,
    #[serde(default = "default_investigation_time")]
    pub investigation_time: f64,
    pub source_model: Vec<SourceModelEntry>,
    #[serde(default = "default_concurrent_tasks")]
    pub concurrent_tasks: usize,
    #[serde(default)]
    pub poes: Vec<f64>,
    #[serde(default)]
    pub quantiles: Vec<f64>,
    #[serde(default = "default_reference_vs30")]
    pub reference_vs30_value: f64,
    #[serde(default)]
    pub reference_vs30_type: Vs30Type,
    #[serde(default = "default_reference_z1pt0")]
    pub reference_depth_to_1pt0km_per_sec: f64,
    #[serde(default = "default_reference_z2pt5")]
    pub reference_depth_to_2pt5km_per_sec: f64,
    #[serde(default)]
    pub reference_backarc: bool,
}

impl JobConfig {
    pub fn reference_site_parameters(&self) -> ReferenceSiteParameters {
        ReferenceSiteParameters {
            vs30: self.reference_vs30_value,
            vs30measured: self.reference_vs30_type == Vs30Type::Measured,
            z1pt0: self.reference_depth_to_1pt0km_per_sec,
            z2pt5: self.reference_depth_to_2pt5km_per_sec,
            backarc: self.reference_backarc,
        }
    }

    pub fn site_collection(&self) -> ConfigResult<SiteCollection> {
        let reference = self.reference_site_parameters();
        let sites = self
            .sites
            .iter()
            .map(|record| record.to_site(reference))
            .collect::<ConfigResult<Vec<_>>>()?;
        SiteCollection::new(&sites)
    }

    fn resolve_gsims(
        &self,
        registry: &GsimRegistry,
    ) -> ConfigResult<BTreeMap<String, Vec<Arc<dyn Gsim>>>> {
        self.gsim_by_trt
            .iter()
            .map(|(trt, selection)| {
                let gsims = selection
                    .names()
                    .iter()
                    .map(|name| registry.resolve(name))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok((trt.clone(), gsims))
            })
            .collect()
    }

    /// Source groups of the model in file order, followed by one
    /// independent group per tectonic region type of the loose sources.
    fn source_groups(source_model: Vec<SourceModelEntry>) -> ConfigResult<Vec<SourceGroup>> {
        let mut groups = Vec::new();
        let mut loose: BTreeMap<String, Vec<Source>> = BTreeMap::new();
        for entry in source_model {
            match entry {
                SourceModelEntry::Group(group) => groups.push(group),
                SourceModelEntry::Source(source) => loose
                    .entry(source.tectonic_region_type().to_string())
                    .or_default()
                    .push(source),
            }
        }
        for sources in loose.into_values() {
            groups.push(SourceGroup::independent(sources)?);
        }
        Ok(groups)
    }

    /// Builds the calculation and validates it.
    pub fn resolve(self, registry: &GsimRegistry) -> ConfigResult<ClassicalCalculation> {
        let sites = self.site_collection()?;
        let gsims_by_trt = self.resolve_gsims(registry)?;
        let tom = TemporalOccurrenceModel::poisson(self.investigation_time)?;
        let groups: Vec<SourceGroup> = Self::source_groups(self.source_model)?
            .into_iter()
            .map(|group| group.with_default_temporal_occurrence_model(tom))
            .collect();
        debug!(
            num_sites = sites.len(),
            num_groups = groups.len(),
            investigation_time = self.investigation_time,
            "resolved job configuration"
        );
        let calculation = ClassicalCalculation::new(
            sites,
            self.imtls,
            groups,
            gsims_by_trt,
            self.maximum_distance,
        )
        .with_truncation_level(self.truncation_level)
        .with_concurrent_tasks(self.concurrent_tasks)
        .with_poes(self.poes)
        .with_quantiles(self.quantiles);
        calculation.validate()?;
        Ok(calculation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobConfigError {
    #[error("failed to read job configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse job configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<JobConfigError> for HazardError {
    fn from(error: JobConfigError) -> Self {
        match &error {
            JobConfigError::Read { .. } => HazardError::io_system("IO.JOB_READ", error.to_string()),
            JobConfigError::Parse { .. } => {
                HazardError::configuration("CONFIG.JOB_PARSE", error.to_string())
            }
        }
    }
}

pub fn load_job_config(job_path: impl AsRef<Path>) -> Result<JobConfig, JobConfigError> {
    let job_path = job_path.as_ref();
    let source = fs::read_to_string(job_path).map_err(|source| JobConfigError::Read {
        path: job_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| JobConfigError::Parse {
        path: job_path.to_path_buf(),
        source,
    })
}
