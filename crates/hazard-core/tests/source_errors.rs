use hazard_core::calc::calc_hazard_curves;
use hazard_core::contexts::Contexts;
use hazard_core::domain::{ComputeResult, HazardError, HazardErrorCategory};
use hazard_core::filters::NoopFilter;
use hazard_core::geo::Point;
use hazard_core::gsim::Gsim;
use hazard_core::imt::{Imt, Imtls};
use hazard_core::site::{ReferenceSiteParameters, SiteCollection};
use hazard_core::source::Source;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

/// Fails for every rupture above magnitude 5.5.
#[derive(Debug)]
struct FailingAboveM55;

impl Gsim for FailingAboveM55 {
    fn name(&self) -> &'static str {
        "FailingAboveM55"
    }

    fn requires_sites_parameters(&self) -> &'static [&'static str] {
        &["vs30"]
    }

    fn requires_rupture_parameters(&self) -> &'static [&'static str] {
        &["mag"]
    }

    fn requires_distances(&self) -> &'static [&'static str] {
        &["rjb"]
    }

    fn supports_imt(&self, imt: &Imt) -> bool {
        matches!(imt, Imt::Pga)
    }

    fn mean_and_stddev(
        &self,
        contexts: &Contexts,
        _imt: &Imt,
    ) -> ComputeResult<(Vec<f64>, Vec<f64>)> {
        let mag = contexts.rupture.require("mag")?;
        if mag > 5.5 {
            return Err(HazardError::computation(
                "RUN.GSIM",
                format!("magnitude {mag} is out of range"),
            ));
        }
        let rjb = contexts.distances.require("rjb")?;
        Ok((
            rjb.iter().map(|distance| -2.0 - 0.01 * distance).collect(),
            vec![0.6; rjb.len()],
        ))
    }
}

fn nonparametric() -> Source {
    serde_json::from_str(
        r#"{
            "kind": "nonParametric", "sourceId": "np-7", "tectonicRegionType": "Active Shallow Crust",
            "ruptures": [
                {
                    "mag": 5.0, "rake": 0.0,
                    "hypocenter": {"lon": 0.0, "lat": 0.05, "depth": 5.0},
                    "surface": {
                        "kind": "planar", "strike": 0.0, "dip": 90.0,
                        "topLeft": {"lon": 0.0, "lat": 0.0, "depth": 0.0},
                        "topRight": {"lon": 0.0, "lat": 0.1, "depth": 0.0},
                        "bottomLeft": {"lon": 0.0, "lat": 0.0, "depth": 10.0},
                        "bottomRight": {"lon": 0.0, "lat": 0.1, "depth": 10.0}
                    },
                    "probabilitiesOfOccurrence": [[0.9, 0], [0.1, 1]]
                },
                {
                    "mag": 6.0, "rake": 0.0,
                    "hypocenter": {"lon": 0.0, "lat": 0.05, "depth": 5.0},
                    "surface": {
                        "kind": "planar", "strike": 0.0, "dip": 90.0,
                        "topLeft": {"lon": 0.0, "lat": 0.0, "depth": 0.0},
                        "topRight": {"lon": 0.0, "lat": 0.1, "depth": 0.0},
                        "bottomLeft": {"lon": 0.0, "lat": 0.0, "depth": 10.0},
                        "bottomRight": {"lon": 0.0, "lat": 0.1, "depth": 10.0}
                    },
                    "probabilitiesOfOccurrence": [[0.8, 0], [0.2, 1]]
                }
            ]
        }"#,
    )
    .expect("non-parametric source")
}

#[test]
fn gsim_failures_name_the_source_and_rupture() {
    let sites = SiteCollection::from_points(
        &[Point::surface(0.1, 0.05)],
        ReferenceSiteParameters::default(),
    )
    .expect("sites");
    let imtls = Imtls::new(vec![(Imt::Pga, vec![0.01, 0.1])]).expect("imtls");
    let gsims = BTreeMap::from([(
        "Active Shallow Crust".to_string(),
        vec![Arc::new(FailingAboveM55) as Arc<dyn Gsim>],
    )]);

    let error = calc_hazard_curves(
        vec![nonparametric()],
        &sites,
        &imtls,
        &gsims,
        Some(3.0),
        &NoopFilter,
        &NoopFilter,
    )
    .expect_err("the second rupture fails");

    assert_eq!(error.category(), HazardErrorCategory::ComputationError);
    assert_eq!(error.placeholder(), "RUN.SOURCE");
    let location = error.location().expect("location");
    assert_eq!(location.source_id, "np-7");
    assert_eq!(location.rupture_index, Some(1));
    assert!(error.message().contains("np-7"));

    let cause = error.source().expect("original cause");
    assert!(cause.to_string().contains("magnitude 6 is out of range"));
    assert_eq!(error.root_cause().placeholder(), "RUN.GSIM");
    assert_eq!(error.exit_code(), 4);
}

#[test]
fn gsims_missing_the_imt_are_rejected_before_any_rupture() {
    let sites = SiteCollection::from_points(
        &[Point::surface(0.1, 0.05)],
        ReferenceSiteParameters::default(),
    )
    .expect("sites");
    let imtls = Imtls::new(vec![(Imt::sa(1.0), vec![0.01])]).expect("imtls");
    let gsims = BTreeMap::from([(
        "Active Shallow Crust".to_string(),
        vec![Arc::new(FailingAboveM55) as Arc<dyn Gsim>],
    )]);
    let error = calc_hazard_curves(
        vec![nonparametric()],
        &sites,
        &imtls,
        &gsims,
        None,
        &NoopFilter,
        &NoopFilter,
    )
    .expect_err("unsupported imt");
    assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
    assert_eq!(error.placeholder(), "CONFIG.GSIM_IMT");
}
