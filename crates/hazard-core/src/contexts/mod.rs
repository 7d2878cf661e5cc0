//! Site, rupture and distance contexts handed to GSIMs.
//!
//! A [`ContextMaker`] is built once per tectonic region type from the GSIMs
//! that will be evaluated there. It validates every declared requirement
//! up front and, per rupture, computes the union of the declared fields
//! exactly once, whatever the number of GSIMs.

use crate::domain::{ComputeResult, ConfigResult, HazardError};
use crate::gsim::Gsim;
use crate::site::{SITE_PARAMETERS, SiteCollection};
use crate::source::Rupture;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const RUPTURE_PARAMETERS: [&str; 9] = [
    "mag",
    "strike",
    "dip",
    "rake",
    "ztor",
    "hypo_lon",
    "hypo_lat",
    "hypo_depth",
    "width",
];

pub const DISTANCE_MEASURES: [&str; 6] = ["rrup", "rjb", "rx", "ry0", "rhypo", "repi"];

fn missing(kind: &str, name: &str) -> HazardError {
    HazardError::internal(
        "SYS.CONTEXT_FIELD",
        format!("{kind} '{name}' was not computed for this context"),
    )
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SitesContext {
    sids: Vec<usize>,
    params: BTreeMap<&'static str, Vec<f64>>,
}

impl SitesContext {
    pub fn sids(&self) -> &[usize] {
        &self.sids
    }

    pub fn len(&self) -> usize {
        self.sids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sids.is_empty()
    }

    pub fn require(&self, name: &str) -> ComputeResult<&[f64]> {
        self.params
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| missing("site parameter", name))
    }

    pub fn with_parameter(mut self, name: &'static str, values: Vec<f64>) -> Self {
        if self.sids.is_empty() {
            self.sids = (0..values.len()).collect();
        }
        self.params.insert(name, values);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuptureContext {
    params: BTreeMap<&'static str, f64>,
}

impl RuptureContext {
    pub fn require(&self, name: &str) -> ComputeResult<f64> {
        self.params
            .get(name)
            .copied()
            .ok_or_else(|| missing("rupture parameter", name))
    }

    pub fn with_parameter(mut self, name: &'static str, value: f64) -> Self {
        self.params.insert(name, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistancesContext {
    values: BTreeMap<&'static str, Vec<f64>>,
}

impl DistancesContext {
    pub fn require(&self, name: &str) -> ComputeResult<&[f64]> {
        self.values
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| missing("distance", name))
    }

    pub fn computed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn with_distance(mut self, name: &'static str, values: Vec<f64>) -> Self {
        self.values.insert(name, values);
        self
    }
}

/// Everything a GSIM sees for one rupture and the sites it affects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contexts {
    pub sites: SitesContext,
    pub rupture: RuptureContext,
    pub distances: DistancesContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextMaker {
    site_params: Vec<&'static str>,
    rupture_params: Vec<&'static str>,
    distances: Vec<&'static str>,
}

fn union_of_requirements(
    gsims: &[Arc<dyn Gsim>],
    kind: &str,
    supported: &[&'static str],
    declared: impl Fn(&dyn Gsim) -> &'static [&'static str],
) -> ConfigResult<Vec<&'static str>> {
    let mut names = BTreeSet::new();
    for gsim in gsims {
        for name in declared(gsim.as_ref()) {
            let Some(known) = supported.iter().find(|candidate| *candidate == name) else {
                return Err(HazardError::configuration(
                    "CONFIG.GSIM_REQUIREMENT",
                    format!(
                        "{} requires unknown {kind} '{name}'",
                        gsim.name()
                    ),
                ));
            };
            names.insert(*known);
        }
    }
    Ok(names.into_iter().collect())
}

impl ContextMaker {
    pub fn new(gsims: &[Arc<dyn Gsim>]) -> ConfigResult<Self> {
        let site_params =
            union_of_requirements(gsims, "site parameter", &SITE_PARAMETERS, |gsim| {
                gsim.requires_sites_parameters()
            })?;
        let rupture_params =
            union_of_requirements(gsims, "rupture parameter", &RUPTURE_PARAMETERS, |gsim| {
                gsim.requires_rupture_parameters()
            })?;
        let distances = union_of_requirements(gsims, "distance", &DISTANCE_MEASURES, |gsim| {
            gsim.requires_distances()
        })?;
        Ok(Self {
            site_params,
            rupture_params,
            distances,
        })
    }

    pub fn site_parameters(&self) -> &[&'static str] {
        &self.site_params
    }

    pub fn rupture_parameters(&self) -> &[&'static str] {
        &self.rupture_params
    }

    pub fn distances(&self) -> &[&'static str] {
        &self.distances
    }

    pub fn make_contexts(
        &self,
        sites: &SiteCollection,
        rupture: &Rupture,
    ) -> ComputeResult<Contexts> {
        let mut sites_context = SitesContext {
            sids: sites.sids().to_vec(),
            params: BTreeMap::new(),
        };
        for name in self.site_params.iter().copied() {
            let values = sites
                .parameter(name)
                .ok_or_else(|| missing("site parameter", name))?;
            sites_context.params.insert(name, values);
        }

        let mut rupture_context = RuptureContext::default();
        for name in self.rupture_params.iter().copied() {
            rupture_context.params.insert(name, rupture_parameter(rupture, name)?);
        }

        let mut distances = DistancesContext::default();
        for name in self.distances.iter().copied() {
            distances.values.insert(name, distance_measure(rupture, sites, name)?);
        }

        Ok(Contexts {
            sites: sites_context,
            rupture: rupture_context,
            distances,
        })
    }
}

fn rupture_parameter(rupture: &Rupture, name: &str) -> ComputeResult<f64> {
    let surface = rupture.surface();
    Ok(match name {
        "mag" => rupture.mag(),
        "rake" => rupture.rake(),
        "strike" => surface.strike(),
        "dip" => surface.dip(),
        "ztor" => surface.top_edge_depth(),
        "width" => surface.width(),
        "hypo_lon" => rupture.hypocenter().lon,
        "hypo_lat" => rupture.hypocenter().lat,
        "hypo_depth" => rupture.hypocenter().depth,
        other => return Err(missing("rupture parameter", other)),
    })
}

fn distance_measure(
    rupture: &Rupture,
    sites: &SiteCollection,
    name: &str,
) -> ComputeResult<Vec<f64>> {
    let surface = rupture.surface();
    let hypocenter = rupture.hypocenter();
    sites
        .locations()
        .map(|site| -> ComputeResult<f64> {
            Ok(match name {
                "rrup" => surface.min_distance(&site),
                "rjb" => surface.joyner_boore_distance(site.lon, site.lat)?,
                "rx" => surface.rx_distance(site.lon, site.lat)?,
                "ry0" => surface.ry0_distance(site.lon, site.lat)?,
                "rhypo" => hypocenter.distance(&site),
                "repi" => hypocenter.epicentral_distance(&site),
                other => return Err(missing("distance", other)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ContextMaker, Contexts};
    use crate::domain::{ComputeResult, HazardErrorCategory};
    use crate::geo::{PlanarSurface, Point};
    use crate::gsim::Gsim;
    use crate::imt::Imt;
    use crate::site::{ReferenceSiteParameters, SiteCollection};
    use crate::source::Rupture;
    use crate::tom::{Occurrence, TemporalOccurrenceModel};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Declares {
        sites: &'static [&'static str],
        rupture: &'static [&'static str],
        distances: &'static [&'static str],
    }

    impl Gsim for Declares {
        fn name(&self) -> &'static str {
            "Declares"
        }
        fn requires_sites_parameters(&self) -> &'static [&'static str] {
            self.sites
        }
        fn requires_rupture_parameters(&self) -> &'static [&'static str] {
            self.rupture
        }
        fn requires_distances(&self) -> &'static [&'static str] {
            self.distances
        }
        fn supports_imt(&self, _imt: &Imt) -> bool {
            true
        }
        fn mean_and_stddev(
            &self,
            contexts: &Contexts,
            _imt: &Imt,
        ) -> ComputeResult<(Vec<f64>, Vec<f64>)> {
            let count = contexts.sites.len();
            Ok((vec![0.0; count], vec![1.0; count]))
        }
    }

    fn rupture() -> Rupture {
        let surface = PlanarSurface::from_corners(
            0.0,
            90.0,
            Point::new(0.0, 0.0, 2.0),
            Point::new(0.0, 0.1, 2.0),
            Point::new(0.0, 0.0, 12.0),
            Point::new(0.0, 0.1, 12.0),
        )
        .expect("surface");
        Rupture::new(
            6.0,
            90.0,
            "Active Shallow Crust",
            Point::new(0.0, 0.05, 7.0),
            surface.into(),
            Occurrence::Parametric {
                rate: 0.01,
                tom: TemporalOccurrenceModel::Poisson { time_span: 50.0 },
            },
        )
    }

    #[test]
    fn unknown_requirements_fail_at_setup() {
        let gsims: Vec<Arc<dyn Gsim>> = vec![Arc::new(Declares {
            sites: &["vs30"],
            rupture: &["mag", "slip_rate"],
            distances: &["rjb"],
        })];
        let error = ContextMaker::new(&gsims).expect_err("unknown rupture parameter");
        assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.GSIM_REQUIREMENT");
        assert!(error.message().contains("slip_rate"));
    }

    #[test]
    fn contexts_hold_the_union_of_requirements() {
        let gsims: Vec<Arc<dyn Gsim>> = vec![
            Arc::new(Declares {
                sites: &["vs30"],
                rupture: &["mag"],
                distances: &["rrup"],
            }),
            Arc::new(Declares {
                sites: &["vs30", "z1pt0"],
                rupture: &["ztor", "mag"],
                distances: &["rx"],
            }),
        ];
        let maker = ContextMaker::new(&gsims).expect("maker");
        assert_eq!(maker.site_parameters(), &["vs30", "z1pt0"]);
        assert_eq!(maker.rupture_parameters(), &["mag", "ztor"]);
        assert_eq!(maker.distances(), &["rrup", "rx"]);

        let sites = SiteCollection::from_points(
            &[Point::surface(0.1, 0.05), Point::surface(-0.1, 0.05)],
            ReferenceSiteParameters::default(),
        )
        .expect("sites");
        let contexts = maker.make_contexts(&sites, &rupture()).expect("contexts");
        assert_eq!(contexts.sites.require("vs30").expect("vs30"), &[760.0, 760.0]);
        assert_eq!(contexts.rupture.require("ztor").expect("ztor"), 2.0);
        assert!(contexts.rupture.require("rake").is_err());
        let rx = contexts.distances.require("rx").expect("rx");
        assert!(rx[0] > 0.0 && rx[1] < 0.0);
        let rrup = contexts.distances.require("rrup").expect("rrup");
        assert!(rrup[0] > 2.0);
        assert!(contexts.distances.require("rjb").is_err());
        assert!(contexts.distances.require("ry0").is_err());
    }
}
