//! End-to-end classical calculation: every tectonic region type is computed
//! once for all of its GSIMs, then the per-GSIM maps are combined into one
//! set of curves per realization of the GSIM logic tree.

use super::hazard_curve::{HazardCurves, SourceCalculator, zero_curves};
use super::probability_map::ProbabilityMap;
use super::stats::{HazardMaps, check_quantile, mean_curve, quantile_curve};
use super::task::{run_blocks, split_in_blocks};
use crate::domain::{ComputeResult, ConfigResult, HazardError, Interdependence};
use crate::filters::{IntegrationDistance, RuptureSitesFilter, SourceSitesFilter};
use crate::gsim::{Gsim, check_truncation_level};
use crate::imt::Imtls;
use crate::site::SiteCollection;
use crate::source::{Source, SourceGroup};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// One choice of GSIM per tectonic region type.
#[derive(Debug, Clone, PartialEq)]
pub struct Realization {
    pub index: usize,
    pub gsims: BTreeMap<String, &'static str>,
    pub weight: f64,
    pub curves: HazardCurves,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalOutput {
    pub realizations: Vec<Realization>,
    pub mean: HazardCurves,
    pub quantiles: Vec<(f64, HazardCurves)>,
    pub hazard_maps: Option<HazardMaps>,
}

#[derive(Debug, Clone)]
pub struct ClassicalCalculation {
    sites: SiteCollection,
    imtls: Imtls,
    groups: Vec<SourceGroup>,
    gsims_by_trt: BTreeMap<String, Vec<Arc<dyn Gsim>>>,
    integration_distance: IntegrationDistance,
    truncation_level: Option<f64>,
    concurrent_tasks: usize,
    poes: Vec<f64>,
    quantiles: Vec<f64>,
}

impl ClassicalCalculation {
    pub fn new(
        sites: SiteCollection,
        imtls: Imtls,
        groups: Vec<SourceGroup>,
        gsims_by_trt: BTreeMap<String, Vec<Arc<dyn Gsim>>>,
        integration_distance: IntegrationDistance,
    ) -> Self {
        Self {
            sites,
            imtls,
            groups,
            gsims_by_trt,
            integration_distance,
            truncation_level: None,
            concurrent_tasks: 1,
            poes: Vec::new(),
            quantiles: Vec::new(),
        }
    }

    pub fn with_truncation_level(mut self, truncation_level: Option<f64>) -> Self {
        self.truncation_level = truncation_level;
        self
    }

    /// Number of blocks to split the independent sources of each tectonic
    /// region type into.
    pub fn with_concurrent_tasks(mut self, concurrent_tasks: usize) -> Self {
        self.concurrent_tasks = concurrent_tasks;
        self
    }

    /// Probabilities of exceedance for hazard maps of the mean curves.
    pub fn with_poes(mut self, poes: Vec<f64>) -> Self {
        self.poes = poes;
        self
    }

    pub fn with_quantiles(mut self, quantiles: Vec<f64>) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn sites(&self) -> &SiteCollection {
        &self.sites
    }

    pub fn imtls(&self) -> &Imtls {
        &self.imtls
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub fn tectonic_region_types(&self) -> BTreeSet<&str> {
        self.groups
            .iter()
            .map(SourceGroup::tectonic_region_type)
            .collect()
    }

    fn gsims_for(&self, trt: &str) -> ConfigResult<&[Arc<dyn Gsim>]> {
        match self.gsims_by_trt.get(trt) {
            Some(gsims) if !gsims.is_empty() => Ok(gsims),
            _ => Err(HazardError::configuration(
                "CONFIG.MISSING_GSIM",
                format!("no GSIM is given for tectonic region type '{trt}'"),
            )),
        }
    }

    /// Every check that does not need a rupture.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.groups.is_empty() {
            return Err(HazardError::configuration(
                "CONFIG.SOURCE_MODEL",
                "the source model has no sources",
            ));
        }
        check_truncation_level(self.truncation_level)?;
        let trts = self.tectonic_region_types();
        self.integration_distance.validate(trts.iter().copied())?;
        let rupture_filter = RuptureSitesFilter::new(self.integration_distance.clone());
        for trt in &trts {
            let gsims = self.gsims_for(trt)?;
            SourceCalculator::new(&self.imtls, gsims, self.truncation_level, &rupture_filter)?;
        }
        if let Some(poe) = self.poes.iter().find(|poe| !(**poe > 0.0 && **poe <= 1.0)) {
            return Err(HazardError::configuration(
                "CONFIG.POES",
                format!("hazard map poes must be in (0, 1], got {poe}"),
            ));
        }
        for quantile in &self.quantiles {
            check_quantile(*quantile)?;
        }
        Ok(())
    }

    fn trt_pmap(
        &self,
        trt: &str,
        source_filter: &SourceSitesFilter,
        rupture_filter: &RuptureSitesFilter,
    ) -> ComputeResult<ProbabilityMap> {
        let gsims = self.gsims_for(trt)?;
        let calculator =
            SourceCalculator::new(&self.imtls, gsims, self.truncation_level, rupture_filter)?;
        let acc0 =
            ProbabilityMap::acc0(self.sites.complete_len(), self.imtls.num_levels(), gsims.len());
        let (independent, correlated): (Vec<&SourceGroup>, Vec<&SourceGroup>) = self
            .groups
            .iter()
            .filter(|group| group.tectonic_region_type() == trt)
            .partition(|group| {
                group.src_interdep() == Interdependence::Indep
                    && group.rup_interdep() == Interdependence::Indep
            });

        let sources: Vec<&Source> = independent
            .iter()
            .flat_map(|group| group.sources())
            .collect();
        // zero-weight sources still have to be computed
        let blocks = split_in_blocks(
            sources,
            self.concurrent_tasks,
            |source| source.weight().max(f64::EPSILON),
            |source| source.tectonic_region_type().to_string(),
        )?;
        info!(
            trt,
            num_blocks = blocks.len(),
            num_gsims = gsims.len(),
            "computing tectonic region type"
        );
        let mut pmap = run_blocks(&blocks, &acc0, |source| {
            calculator.source_pmap(
                source,
                &self.sites,
                source_filter,
                Interdependence::Indep,
            )
        })?;
        for group in correlated {
            debug!(
                trt,
                group = group.name(),
                src_interdep = %group.src_interdep(),
                rup_interdep = %group.rup_interdep(),
                "computing correlated source group"
            );
            pmap.combine_in_place(&calculator.group_pmap(group, &self.sites, source_filter)?)?;
        }
        Ok(pmap)
    }

    pub fn run(&self) -> ComputeResult<ClassicalOutput> {
        self.validate()?;
        info!(
            num_sources = self.groups.iter().map(|group| group.sources().len()).sum::<usize>(),
            num_sites = self.sites.len(),
            num_levels = self.imtls.num_levels(),
            concurrent_tasks = self.concurrent_tasks,
            "starting classical calculation"
        );
        let source_filter = SourceSitesFilter::new(self.integration_distance.clone());
        let rupture_filter = RuptureSitesFilter::new(self.integration_distance.clone());
        let pmaps = self
            .tectonic_region_types()
            .into_iter()
            .map(|trt| -> ComputeResult<(&str, ProbabilityMap)> {
                Ok((trt, self.trt_pmap(trt, &source_filter, &rupture_filter)?))
            })
            .collect::<ComputeResult<Vec<_>>>()?;

        let realizations = self.realizations(&pmaps)?;
        info!(num_realizations = realizations.len(), "computing statistics");
        let curves: Vec<_> = realizations
            .iter()
            .map(|realization| realization.curves.poes().clone())
            .collect();
        let weights: Vec<f64> = realizations.iter().map(|realization| realization.weight).collect();
        let mean = HazardCurves::new(self.imtls.clone(), mean_curve(&curves, &weights)?)?;
        let quantiles = self
            .quantiles
            .iter()
            .map(|quantile| -> ComputeResult<(f64, HazardCurves)> {
                let poes = quantile_curve(&curves, *quantile, &weights)?;
                Ok((*quantile, HazardCurves::new(self.imtls.clone(), poes)?))
            })
            .collect::<ComputeResult<Vec<_>>>()?;
        let hazard_maps = if self.poes.is_empty() {
            None
        } else {
            Some(HazardMaps::from_curves(&mean, &self.poes)?)
        };
        Ok(ClassicalOutput {
            realizations,
            mean,
            quantiles,
            hazard_maps,
        })
    }

    /// Cartesian product of the GSIMs of every tectonic region type, each
    /// GSIM of a type weighted equally.
    fn realizations(&self, pmaps: &[(&str, ProbabilityMap)]) -> ComputeResult<Vec<Realization>> {
        let choices = pmaps
            .iter()
            .map(|(trt, _)| self.gsims_for(trt))
            .collect::<ConfigResult<Vec<_>>>()?;
        let mut realizations = Vec::new();
        let mut selected = vec![0usize; pmaps.len()];
        loop {
            let mut curves = zero_curves(self.sites.complete_len(), &self.imtls);
            let mut gsims = BTreeMap::new();
            let mut weight = 1.0;
            for (((trt, pmap), gsim), options) in pmaps.iter().zip(&selected).zip(&choices) {
                let contribution = HazardCurves::new(self.imtls.clone(), pmap.to_curves(*gsim))?;
                curves = curves.agg(&contribution)?;
                gsims.insert(trt.to_string(), options[*gsim].name());
                weight /= options.len() as f64;
            }
            debug!(index = realizations.len(), weight, ?gsims, "realization");
            realizations.push(Realization {
                index: realizations.len(),
                gsims,
                weight,
                curves,
            });

            let Some(position) = selected
                .iter()
                .zip(&choices)
                .rposition(|(gsim, options)| gsim + 1 < options.len())
            else {
                break;
            };
            selected[position] += 1;
            for later in &mut selected[position + 1..] {
                *later = 0;
            }
        }
        Ok(realizations)
    }
}
