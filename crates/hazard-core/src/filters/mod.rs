//! Distance filters that drop source/site and rupture/site pairs beyond
//! the integration distance before any GSIM is evaluated.

use crate::domain::{ComputeResult, ConfigResult, HazardError};
use crate::site::SiteCollection;
use crate::source::{Rupture, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum source-to-site distance in km, global or per tectonic region
/// type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IntegrationDistance {
    Scalar(f64),
    ByTrt(BTreeMap<String, f64>),
}

impl IntegrationDistance {
    pub fn get(&self, tectonic_region_type: &str) -> ConfigResult<f64> {
        match self {
            Self::Scalar(distance) => Ok(*distance),
            Self::ByTrt(distances) => distances.get(tectonic_region_type).copied().ok_or_else(|| {
                HazardError::configuration(
                    "CONFIG.INTEGRATION_DISTANCE",
                    format!("integration distance is not defined for '{tectonic_region_type}'"),
                )
            }),
        }
    }

    /// Checks that every distance is positive and that every tectonic
    /// region type in `trts` has one.
    pub fn validate<'a>(&self, trts: impl IntoIterator<Item = &'a str>) -> ConfigResult<()> {
        let positive = |trt: &str, distance: f64| {
            if distance > 0.0 {
                Ok(())
            } else {
                Err(HazardError::configuration(
                    "CONFIG.INTEGRATION_DISTANCE",
                    format!("integration distance for '{trt}' must be positive, got {distance}"),
                ))
            }
        };
        match self {
            Self::Scalar(distance) => positive("all tectonic region types", *distance)?,
            Self::ByTrt(distances) => {
                for (trt, distance) in distances {
                    positive(trt, *distance)?;
                }
            }
        }
        for trt in trts {
            self.get(trt)?;
        }
        Ok(())
    }
}

pub trait SourceSiteFilter: Send + Sync {
    /// Sites that may be affected by `source`, or `None` when none are.
    fn filter(&self, source: &Source, sites: &SiteCollection)
    -> ComputeResult<Option<SiteCollection>>;

    /// Fails when the filter cannot handle sources of this tectonic region
    /// type. Called once per type before any source is filtered.
    fn check_tectonic_region_type(&self, _tectonic_region_type: &str) -> ConfigResult<()> {
        Ok(())
    }
}

pub trait RuptureSiteFilter: Send + Sync {
    /// Sites within range of `rupture`, or `None` when none are.
    fn filter(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
    ) -> ComputeResult<Option<SiteCollection>>;

    fn check_tectonic_region_type(&self, _tectonic_region_type: &str) -> ConfigResult<()> {
        Ok(())
    }
}

/// Keeps the sites whose source envelope distance is within the
/// integration distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSitesFilter {
    integration_distance: IntegrationDistance,
}

impl SourceSitesFilter {
    pub fn new(integration_distance: IntegrationDistance) -> Self {
        Self {
            integration_distance,
        }
    }
}

impl SourceSiteFilter for SourceSitesFilter {
    fn filter(
        &self,
        source: &Source,
        sites: &SiteCollection,
    ) -> ComputeResult<Option<SiteCollection>> {
        let max_distance = self
            .integration_distance
            .get(source.tectonic_region_type())?;
        let distances = source.envelope_distance(sites)?;
        let mask: Vec<bool> = distances
            .iter()
            .map(|distance| *distance <= max_distance)
            .collect();
        Ok(sites.filter(&mask))
    }

    fn check_tectonic_region_type(&self, tectonic_region_type: &str) -> ConfigResult<()> {
        self.integration_distance.get(tectonic_region_type).map(|_| ())
    }
}

/// Keeps the sites whose Joyner-Boore distance to the rupture is within
/// the integration distance.
#[derive(Debug, Clone, PartialEq)]
pub struct RuptureSitesFilter {
    integration_distance: IntegrationDistance,
}

impl RuptureSitesFilter {
    pub fn new(integration_distance: IntegrationDistance) -> Self {
        Self {
            integration_distance,
        }
    }
}

impl RuptureSiteFilter for RuptureSitesFilter {
    fn filter(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
    ) -> ComputeResult<Option<SiteCollection>> {
        let max_distance = self
            .integration_distance
            .get(rupture.tectonic_region_type())?;
        let surface = rupture.surface();
        let mask = sites
            .locations()
            .map(|site| -> ComputeResult<bool> {
                Ok(surface.joyner_boore_distance(site.lon, site.lat)? <= max_distance)
            })
            .collect::<ComputeResult<Vec<_>>>()?;
        Ok(sites.filter(&mask))
    }

    fn check_tectonic_region_type(&self, tectonic_region_type: &str) -> ConfigResult<()> {
        self.integration_distance.get(tectonic_region_type).map(|_| ())
    }
}

/// Passes every site through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoopFilter;

impl SourceSiteFilter for NoopFilter {
    fn filter(
        &self,
        _source: &Source,
        sites: &SiteCollection,
    ) -> ComputeResult<Option<SiteCollection>> {
        Ok(Some(sites.clone()))
    }
}

impl RuptureSiteFilter for NoopFilter {
    fn filter(
        &self,
        _rupture: &Rupture,
        sites: &SiteCollection,
    ) -> ComputeResult<Option<SiteCollection>> {
        Ok(Some(sites.clone()))
    }
}
