//! Classical hazard curves.
//!
//! The probability of exceeding a level at a site in the investigation time
//! is `1 - prod_sources prod_ruptures P(no exceedance | rupture)`, assuming
//! independent sources and independent ruptures. Groups of mutually
//! exclusive sources or ruptures replace the products by weighted sums.

use super::probability_map::ProbabilityMap;
use crate::contexts::ContextMaker;
use crate::domain::{ComputeResult, ConfigResult, HazardError, Interdependence};
use crate::filters::{RuptureSiteFilter, SourceSiteFilter};
use crate::gsim::{Gsim, check_truncation_level, get_poes};
use crate::imt::{Imt, Imtls};
use crate::site::SiteCollection;
use crate::source::{Rupture, Source, SourceGroup};
use faer::Mat;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Site-indexed hazard curves: one row per site of the complete collection,
/// one column per level of the flat level axis of `imtls`.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardCurves {
    imtls: Imtls,
    poes: Mat<f64>,
}

impl HazardCurves {
    pub fn new(imtls: Imtls, poes: Mat<f64>) -> ComputeResult<Self> {
        if poes.ncols() != imtls.num_levels() {
            return Err(HazardError::internal(
                "SYS.CURVES_SHAPE",
                format!(
                    "{} curve values per site for {} intensity levels",
                    poes.ncols(),
                    imtls.num_levels()
                ),
            ));
        }
        Ok(Self { imtls, poes })
    }

    pub fn num_sites(&self) -> usize {
        self.poes.nrows()
    }

    pub fn imtls(&self) -> &Imtls {
        &self.imtls
    }

    pub fn poes(&self) -> &Mat<f64> {
        &self.poes
    }

    /// Curves of one IMT as a sites x levels matrix.
    pub fn field(&self, imt: &Imt) -> Option<Mat<f64>> {
        let (_, range) = self.imtls.slices().find(|(candidate, _)| *candidate == imt)?;
        Some(Mat::from_fn(self.num_sites(), range.len(), |site, level| {
            self.poes[(site, range.start + level)]
        }))
    }

    pub fn curve(&self, site: usize, imt: &Imt) -> Option<Vec<f64>> {
        if site >= self.num_sites() {
            return None;
        }
        let (_, range) = self.imtls.slices().find(|(candidate, _)| *candidate == imt)?;
        Some(range.map(|column| self.poes[(site, column)]).collect())
    }

    /// Curves of independent contributions composed with [`agg_curves`].
    pub fn agg(&self, other: &HazardCurves) -> ComputeResult<HazardCurves> {
        if self.imtls != other.imtls {
            return Err(HazardError::internal(
                "SYS.CURVES_SHAPE",
                "cannot aggregate curves computed on different intensity levels",
            ));
        }
        Ok(Self {
            imtls: self.imtls.clone(),
            poes: agg_curves(&self.poes, &other.poes)?,
        })
    }
}

/// Curves with zero probability of exceedance everywhere.
pub fn zero_curves(num_sites: usize, imtls: &Imtls) -> HazardCurves {
    HazardCurves {
        imtls: imtls.clone(),
        poes: Mat::zeros(num_sites, imtls.num_levels()),
    }
}

/// Composes two sets of probabilities of exceedance of independent events:
/// `1 - (1 - acc) * (1 - curves)`.
pub fn agg_curves(acc: &Mat<f64>, curves: &Mat<f64>) -> ComputeResult<Mat<f64>> {
    if acc.nrows() != curves.nrows() || acc.ncols() != curves.ncols() {
        return Err(HazardError::internal(
            "SYS.CURVES_SHAPE",
            format!(
                "cannot aggregate {}x{} curves with {}x{} curves",
                acc.nrows(),
                acc.ncols(),
                curves.nrows(),
                curves.ncols()
            ),
        ));
    }
    Ok(Mat::from_fn(acc.nrows(), acc.ncols(), |row, col| {
        1.0 - (1.0 - acc[(row, col)]) * (1.0 - curves[(row, col)])
    }))
}

/// The per-rupture half of the calculation for one tectonic region type:
/// contexts, GSIM evaluation and the fold into no-exceedance space.
pub struct SourceCalculator<'a> {
    imtls: &'a Imtls,
    gsims: &'a [Arc<dyn Gsim>],
    context_maker: ContextMaker,
    truncation_level: Option<f64>,
    rupture_filter: &'a dyn RuptureSiteFilter,
}

impl<'a> SourceCalculator<'a> {
    /// Checks everything that can be checked before a rupture is seen.
    pub fn new(
        imtls: &'a Imtls,
        gsims: &'a [Arc<dyn Gsim>],
        truncation_level: Option<f64>,
        rupture_filter: &'a dyn RuptureSiteFilter,
    ) -> ConfigResult<Self> {
        check_truncation_level(truncation_level)?;
        if gsims.is_empty() {
            return Err(HazardError::configuration(
                "CONFIG.MISSING_GSIM",
                "at least one GSIM is required",
            ));
        }
        for gsim in gsims {
            if let Some(imt) = imtls.imts().find(|imt| !gsim.supports_imt(imt)) {
                return Err(HazardError::configuration(
                    "CONFIG.GSIM_IMT",
                    format!("{} does not support {imt}", gsim.name()),
                ));
            }
        }
        Ok(Self {
            imtls,
            gsims,
            context_maker: ContextMaker::new(gsims)?,
            truncation_level,
            rupture_filter,
        })
    }

    pub fn num_gsims(&self) -> usize {
        self.gsims.len()
    }

    /// Probability of no exceedance caused by `rupture` at each of `sites`,
    /// one sites x levels matrix per GSIM.
    pub fn probability_no_exceedance(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
    ) -> ComputeResult<Vec<Mat<f64>>> {
        let contexts = self.context_maker.make_contexts(sites, rupture)?;
        self.gsims
            .iter()
            .map(|gsim| -> ComputeResult<Mat<f64>> {
                let mut pne = Mat::zeros(sites.len(), self.imtls.num_levels());
                for ((imt, levels), (_, range)) in self.imtls.iter().zip(self.imtls.slices()) {
                    let poes =
                        get_poes(gsim.as_ref(), &contexts, imt, levels, self.truncation_level)?;
                    for (offset, column) in range.enumerate() {
                        for site in 0..sites.len() {
                            pne[(site, column)] =
                                rupture.probability_no_exceedance(poes[(site, offset)]);
                        }
                    }
                }
                Ok(pne)
            })
            .collect()
    }

    /// No-exceedance map of one source over the complete site collection.
    ///
    /// Independent ruptures multiply. Mutually exclusive ruptures sum their
    /// no-exceedance weighted by rupture weight (uniform `1/nr` unless the
    /// rupture carries one); sites a rupture does not reach count as 1.
    pub fn poe_map(
        &self,
        source: &Source,
        sites: &SiteCollection,
        rup_interdep: Interdependence,
    ) -> ComputeResult<ProbabilityMap> {
        let num_sites = sites.complete_len();
        let num_levels = self.imtls.num_levels();
        let mutex = rup_interdep == Interdependence::Mutex;
        let mut pmap = if mutex {
            ProbabilityMap::filled(num_sites, num_levels, self.num_gsims(), 0.0)
        } else {
            ProbabilityMap::acc0(num_sites, num_levels, self.num_gsims())
        };
        let uniform_weight = 1.0 / source.count_ruptures().max(1) as f64;
        let in_source = |index: usize, error: HazardError| {
            HazardError::in_source(source.source_id(), Some(index), error)
        };

        let mut num_ruptures = 0;
        let mut num_contributing = 0;
        for (index, rupture) in source.iter_ruptures().enumerate() {
            num_ruptures += 1;
            let rupture = rupture.map_err(|error| in_source(index, error))?;
            let weight = rupture.weight().unwrap_or(uniform_weight);
            let Some(rupture_sites) = self
                .rupture_filter
                .filter(&rupture, sites)
                .map_err(|error| in_source(index, error))?
            else {
                if mutex {
                    pmap.add_constant(weight);
                }
                continue;
            };
            num_contributing += 1;
            let pnes = self
                .probability_no_exceedance(&rupture, &rupture_sites)
                .map_err(|error| in_source(index, error))?;
            for (gsim, pne) in pnes.iter().enumerate() {
                let expanded = rupture_sites.expand_rows(pne, 1.0);
                if mutex {
                    pmap.add_weighted(gsim, &expanded, weight)?;
                } else {
                    pmap.multiply(gsim, &expanded)?;
                }
            }
        }
        debug!(
            source_id = source.source_id(),
            num_ruptures,
            num_contributing,
            "computed source contribution"
        );
        Ok(pmap)
    }

    /// Source-site filtering followed by [`Self::poe_map`]; `None` when the
    /// source reaches no site.
    pub fn source_pmap(
        &self,
        source: &Source,
        sites: &SiteCollection,
        source_filter: &dyn SourceSiteFilter,
        rup_interdep: Interdependence,
    ) -> ComputeResult<Option<ProbabilityMap>> {
        let Some(source_sites) = source_filter.filter(source, sites)? else {
            debug!(source_id = source.source_id(), "source is out of range of all sites");
            return Ok(None);
        };
        self.poe_map(source, &source_sites, rup_interdep).map(Some)
    }

    /// No-exceedance map of a group of sources of one tectonic region type,
    /// one matrix per GSIM.
    pub fn group_pmap(
        &self,
        group: &SourceGroup,
        sites: &SiteCollection,
        source_filter: &dyn SourceSiteFilter,
    ) -> ComputeResult<ProbabilityMap> {
        let num_sites = sites.complete_len();
        let num_levels = self.imtls.num_levels();
        let rup_interdep = group.rup_interdep();
        match group.src_interdep() {
            Interdependence::Indep => {
                let mut pmap = ProbabilityMap::acc0(num_sites, num_levels, self.num_gsims());
                for source in group.sources() {
                    if let Some(contribution) =
                        self.source_pmap(source, sites, source_filter, rup_interdep)?
                    {
                        pmap.combine_in_place(&contribution)?;
                    }
                }
                Ok(pmap)
            }
            Interdependence::Mutex => {
                let mut poes: Vec<Mat<f64>> = (0..self.num_gsims())
                    .map(|_| Mat::zeros(num_sites, num_levels))
                    .collect();
                for (source, weight) in group.sources().iter().zip(group.source_weights()) {
                    if weight == 0.0 {
                        continue;
                    }
                    let Some(contribution) =
                        self.source_pmap(source, sites, source_filter, rup_interdep)?
                    else {
                        continue;
                    };
                    for (gsim, acc) in poes.iter_mut().enumerate() {
                        let curves = contribution.to_curves(gsim);
                        for col in 0..num_levels {
                            for row in 0..num_sites {
                                acc[(row, col)] += weight * curves[(row, col)];
                            }
                        }
                    }
                }
                Ok(ProbabilityMap::from_poes(&poes))
            }
        }
    }
}

/// No-exceedance map of one source group for every GSIM in `gsims`.
pub fn pmap_from_group(
    group: &SourceGroup,
    sites: &SiteCollection,
    imtls: &Imtls,
    gsims: &[Arc<dyn Gsim>],
    truncation_level: Option<f64>,
    source_filter: &dyn SourceSiteFilter,
    rupture_filter: &dyn RuptureSiteFilter,
) -> ComputeResult<ProbabilityMap> {
    source_filter.check_tectonic_region_type(group.tectonic_region_type())?;
    rupture_filter.check_tectonic_region_type(group.tectonic_region_type())?;
    let calculator = SourceCalculator::new(imtls, gsims, truncation_level, rupture_filter)?;
    calculator.group_pmap(group, sites, source_filter)
}

/// No-exceedance map of a single source, already restricted to the sites
/// it may affect.
pub fn poe_map(
    source: &Source,
    sites: &SiteCollection,
    imtls: &Imtls,
    gsims: &[Arc<dyn Gsim>],
    truncation_level: Option<f64>,
    rupture_filter: &dyn RuptureSiteFilter,
) -> ComputeResult<ProbabilityMap> {
    let calculator = SourceCalculator::new(imtls, gsims, truncation_level, rupture_filter)?;
    calculator.poe_map(source, sites, Interdependence::Indep)
}

/// Hazard curves of independent sources, exactly one GSIM per tectonic
/// region type.
pub fn calc_hazard_curves(
    sources: Vec<Source>,
    sites: &SiteCollection,
    imtls: &Imtls,
    gsim_by_trt: &BTreeMap<String, Vec<Arc<dyn Gsim>>>,
    truncation_level: Option<f64>,
    source_filter: &dyn SourceSiteFilter,
    rupture_filter: &dyn RuptureSiteFilter,
) -> ComputeResult<HazardCurves> {
    let mut by_trt: BTreeMap<String, Vec<Source>> = BTreeMap::new();
    for source in sources {
        by_trt
            .entry(source.tectonic_region_type().to_string())
            .or_default()
            .push(source);
    }
    let groups = by_trt
        .into_values()
        .map(SourceGroup::independent)
        .collect::<ConfigResult<Vec<_>>>()?;
    calc_hazard_curves_for_groups(
        &groups,
        sites,
        imtls,
        gsim_by_trt,
        truncation_level,
        source_filter,
        rupture_filter,
    )
}

/// Hazard curves of independent source groups, each of which may hold
/// mutually exclusive sources or ruptures.
pub fn calc_hazard_curves_for_groups(
    groups: &[SourceGroup],
    sites: &SiteCollection,
    imtls: &Imtls,
    gsim_by_trt: &BTreeMap<String, Vec<Arc<dyn Gsim>>>,
    truncation_level: Option<f64>,
    source_filter: &dyn SourceSiteFilter,
    rupture_filter: &dyn RuptureSiteFilter,
) -> ComputeResult<HazardCurves> {
    let mut calculators = BTreeMap::new();
    for group in groups {
        let trt = group.tectonic_region_type();
        if calculators.contains_key(trt) {
            continue;
        }
        let gsims = select_single_gsim(gsim_by_trt, trt)?;
        source_filter.check_tectonic_region_type(trt)?;
        rupture_filter.check_tectonic_region_type(trt)?;
        calculators.insert(
            trt,
            SourceCalculator::new(imtls, gsims, truncation_level, rupture_filter)?,
        );
    }

    info!(
        num_groups = groups.len(),
        num_sources = groups.iter().map(|group| group.sources().len()).sum::<usize>(),
        num_sites = sites.len(),
        "computing hazard curves"
    );
    let mut pmap = ProbabilityMap::acc0(sites.complete_len(), imtls.num_levels(), 1);
    for group in groups {
        let trt = group.tectonic_region_type();
        let Some(calculator) = calculators.get(trt) else {
            continue;
        };
        info!(trt, num_sources = group.sources().len(), "processing source group");
        pmap.combine_in_place(&calculator.group_pmap(group, sites, source_filter)?)?;
    }
    HazardCurves::new(imtls.clone(), pmap.to_curves(0))
}

fn select_single_gsim<'g>(
    gsim_by_trt: &'g BTreeMap<String, Vec<Arc<dyn Gsim>>>,
    trt: &str,
) -> ConfigResult<&'g [Arc<dyn Gsim>]> {
    let gsims = gsim_by_trt.get(trt).ok_or_else(|| {
        HazardError::configuration(
            "CONFIG.MISSING_GSIM",
            format!("no GSIM is given for tectonic region type '{trt}'"),
        )
    })?;
    if gsims.len() != 1 {
        return Err(HazardError::configuration(
            "CONFIG.GSIM_SELECTION",
            format!(
                "exactly one GSIM per tectonic region type is needed, '{trt}' has {}",
                gsims.len()
            ),
        ));
    }
    Ok(gsims.as_slice())
}

#[cfg(test)]
mod tests {
    use super::{HazardCurves, SourceCalculator, agg_curves, zero_curves};
    use crate::contexts::Contexts;
    use crate::domain::{ComputeResult, Interdependence};
    use crate::filters::{IntegrationDistance, NoopFilter, RuptureSitesFilter};
    use crate::geo::Point;
    use crate::gsim::Gsim;
    use crate::imt::{Imt, Imtls};
    use crate::numerics::norm_sf;
    use crate::site::{ReferenceSiteParameters, SiteCollection};
    use crate::source::{Source, SourceGroup};
    use faer::Mat;
    use std::sync::Arc;

    const LEVELS: [f64; 3] = [0.05, 0.1, 0.3];
    const MEDIAN: f64 = 0.1;
    const SIGMA: f64 = 0.6;

    /// Same median everywhere, whatever the rupture or the distance.
    #[derive(Debug)]
    struct Flat;

    impl Gsim for Flat {
        fn name(&self) -> &'static str {
            "Flat"
        }
        fn requires_sites_parameters(&self) -> &'static [&'static str] {
            &[]
        }
        fn requires_rupture_parameters(&self) -> &'static [&'static str] {
            &[]
        }
        fn requires_distances(&self) -> &'static [&'static str] {
            &[]
        }
        fn supports_imt(&self, imt: &Imt) -> bool {
            matches!(imt, Imt::Pga)
        }
        fn mean_and_stddev(
            &self,
            contexts: &Contexts,
            _imt: &Imt,
        ) -> ComputeResult<(Vec<f64>, Vec<f64>)> {
            let count = contexts.sites.len();
            Ok((vec![MEDIAN.ln(); count], vec![SIGMA; count]))
        }
    }

    fn poe(level: f64) -> f64 {
        norm_sf((level.ln() - MEDIAN.ln()) / SIGMA)
    }

    /// One planar rupture per `(lon, weight, pmf)`.
    fn nonparametric(id: &str, ruptures: &[(f64, Option<f64>, &str)]) -> Source {
        let ruptures: Vec<String> = ruptures
            .iter()
            .map(|(lon, weight, pmf)| {
                let weight = weight.map_or(String::new(), |weight| format!(r#""weight": {weight},"#));
                format!(
                    r#"{{
                        "mag": 6.0, "rake": 0.0, {weight}
                        "hypocenter": {{"lon": {lon}, "lat": 0.05, "depth": 5.0}},
                        "surface": {{
                            "kind": "planar", "strike": 0.0, "dip": 90.0,
                            "topLeft": {{"lon": {lon}, "lat": 0.0, "depth": 0.0}},
                            "topRight": {{"lon": {lon}, "lat": 0.1, "depth": 0.0}},
                            "bottomLeft": {{"lon": {lon}, "lat": 0.0, "depth": 10.0}},
                            "bottomRight": {{"lon": {lon}, "lat": 0.1, "depth": 10.0}}
                        }},
                        "probabilitiesOfOccurrence": {pmf}
                    }}"#
                )
            })
            .collect();
        serde_json::from_str(&format!(
            r#"{{"kind": "nonParametric", "sourceId": "{id}",
                "tectonicRegionType": "Active Shallow Crust", "ruptures": [{}]}}"#,
            ruptures.join(",")
        ))
        .expect("non-parametric source")
    }

    fn one_site() -> SiteCollection {
        SiteCollection::from_points(&[Point::surface(0.1, 0.05)], ReferenceSiteParameters::default())
            .expect("sites")
    }

    fn pga() -> Imtls {
        Imtls::new(vec![(Imt::Pga, LEVELS.to_vec())]).expect("imtls")
    }

    fn flat() -> Vec<Arc<dyn Gsim>> {
        vec![Arc::new(Flat)]
    }

    fn curves(values: [f64; 3]) -> Mat<f64> {
        Mat::from_fn(1, 3, |_, col| values[col])
    }

    #[test]
    fn agg_curves_is_associative_and_commutative() {
        let a = curves([0.3, 0.2, 0.01]);
        let b = curves([0.5, 0.1, 0.0]);
        let c = curves([0.9, 0.4, 0.05]);
        let left = agg_curves(&agg_curves(&a, &b).expect("ab"), &c).expect("ab,c");
        let right = agg_curves(&a, &agg_curves(&b, &c).expect("bc")).expect("a,bc");
        let swapped = agg_curves(&agg_curves(&b, &a).expect("ba"), &c).expect("ba,c");
        for col in 0..3 {
            assert!((left[(0, col)] - right[(0, col)]).abs() < 1.0e-10);
            assert!((left[(0, col)] - swapped[(0, col)]).abs() < 1.0e-10);
        }
        assert!((left[(0, 0)] - (1.0 - 0.7 * 0.5 * 0.1)).abs() < 1.0e-12);
    }

    #[test]
    fn zero_curves_are_the_identity_of_agg() {
        let imtls = Imtls::new(vec![(Imt::Pga, vec![0.1, 0.2, 0.4])]).expect("imtls");
        let zero = zero_curves(1, &imtls);
        let some = HazardCurves::new(imtls, curves([0.4, 0.3, 0.2])).expect("curves");
        let aggregated = zero.agg(&some).expect("agg");
        for col in 0..3 {
            assert!((aggregated.poes()[(0, col)] - some.poes()[(0, col)]).abs() < 1.0e-15);
        }
    }

    #[test]
    fn fields_follow_the_imtls_order() {
        let imtls = Imtls::new(vec![
            (Imt::Pga, vec![0.1, 0.2]),
            (Imt::sa(0.5), vec![0.05]),
        ])
        .expect("imtls");
        let poes = Mat::from_fn(2, 3, |site, col| (site * 10 + col) as f64 / 100.0);
        let curves = HazardCurves::new(imtls, poes).expect("curves");
        assert_eq!(curves.curve(1, &Imt::Pga), Some(vec![0.10, 0.11]));
        assert_eq!(curves.curve(0, &Imt::sa(0.5)), Some(vec![0.02]));
        let field = curves.field(&Imt::sa(0.5)).expect("sa field");
        assert_eq!((field.nrows(), field.ncols()), (2, 1));
        assert_eq!(field[(1, 0)], 0.12);
        assert!(curves.curve(0, &Imt::Pgv).is_none());
        assert!(curves.curve(2, &Imt::Pga).is_none());
    }

    #[test]
    fn mismatched_level_count_is_rejected() {
        let imtls = Imtls::new(vec![(Imt::Pga, vec![0.1])]).expect("imtls");
        let error = HazardCurves::new(imtls, Mat::zeros(1, 2)).expect_err("two columns");
        assert_eq!(error.placeholder(), "SYS.CURVES_SHAPE");
    }

    #[test]
    fn mutex_ruptures_mix_their_no_exceedance_by_weight() {
        let source = nonparametric(
            "np",
            &[
                (0.0, Some(0.4), "[[0.8, 0], [0.2, 1]]"),
                (0.0, Some(0.6), "[[0.7, 0], [0.2, 1], [0.1, 2]]"),
            ],
        );
        let (imtls, gsims) = (pga(), flat());
        let calculator = SourceCalculator::new(&imtls, &gsims, None, &NoopFilter).expect("calc");
        let pmap = calculator
            .poe_map(&source, &one_site(), Interdependence::Mutex)
            .expect("pmap");
        let curves = pmap.to_curves(0);
        for (col, level) in LEVELS.iter().enumerate() {
            let miss = 1.0 - poe(*level);
            let first = 0.8 + 0.2 * miss;
            let second = 0.7 + 0.2 * miss + 0.1 * miss * miss;
            let expected = 1.0 - (0.4 * first + 0.6 * second);
            assert!((curves[(0, col)] - expected).abs() < 1.0e-12);
            assert!((0.0..=1.0).contains(&curves[(0, col)]));
        }
    }

    #[test]
    fn mutex_ruptures_out_of_range_contribute_their_weight() {
        let source = nonparametric(
            "np",
            &[
                (0.0, Some(0.25), "[[0.6, 0], [0.4, 1]]"),
                (5.0, Some(0.75), "[[0.1, 0], [0.9, 1]]"),
            ],
        );
        let (imtls, gsims) = (pga(), flat());
        let filter = RuptureSitesFilter::new(IntegrationDistance::Scalar(50.0));
        let calculator = SourceCalculator::new(&imtls, &gsims, None, &filter).expect("calc");
        let pmap = calculator
            .poe_map(&source, &one_site(), Interdependence::Mutex)
            .expect("pmap");
        for (col, level) in LEVELS.iter().enumerate() {
            let near = 0.6 + 0.4 * (1.0 - poe(*level));
            let expected = 0.25 * near + 0.75;
            assert!((pmap.pne(0)[(0, col)] - expected).abs() < 1.0e-12);
        }
    }

    #[test]
    fn mutex_sources_sum_their_weighted_poes() {
        let a = nonparametric("a", &[(0.0, None, "[[0.5, 0], [0.5, 1]]")]);
        let b = nonparametric("b", &[(0.05, None, "[[0.9, 0], [0.1, 1]]")]);
        let group = SourceGroup::new(
            "mutex sources",
            vec![a, b],
            Interdependence::Mutex,
            Interdependence::Indep,
            Some(vec![0.3, 0.7]),
        )
        .expect("group");
        let (imtls, gsims) = (pga(), flat());
        let calculator = SourceCalculator::new(&imtls, &gsims, None, &NoopFilter).expect("calc");
        let curves = calculator
            .group_pmap(&group, &one_site(), &NoopFilter)
            .expect("pmap")
            .to_curves(0);
        for (col, level) in LEVELS.iter().enumerate() {
            let poe_a = 0.5 * poe(*level);
            let poe_b = 0.1 * poe(*level);
            let expected = 0.3 * poe_a + 0.7 * poe_b;
            assert!((curves[(0, col)] - expected).abs() < 1.0e-12);
        }
    }
}
