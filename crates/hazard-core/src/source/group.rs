use super::{Source, SourceKind};
use crate::common::constants::PMF_SUM_TOLERANCE;
use crate::domain::{ConfigResult, HazardError, Interdependence};
use crate::tom::TemporalOccurrenceModel;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceGroupRecord {
    #[serde(default)]
    name: String,
    sources: Vec<Source>,
    #[serde(default)]
    src_interdep: Interdependence,
    #[serde(default)]
    rup_interdep: Interdependence,
    #[serde(default)]
    srcs_weights: Option<Vec<f64>>,
}

impl TryFrom<SourceGroupRecord> for SourceGroup {
    type Error = HazardError;

    fn try_from(record: SourceGroupRecord) -> Result<Self, Self::Error> {
        SourceGroup::new(
            record.name,
            record.sources,
            record.src_interdep,
            record.rup_interdep,
            record.srcs_weights,
        )
    }
}

/// Sources of one tectonic region type sharing an interdependence model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SourceGroupRecord")]
pub struct SourceGroup {
    name: String,
    sources: Vec<Source>,
    src_interdep: Interdependence,
    rup_interdep: Interdependence,
    srcs_weights: Option<Vec<f64>>,
}

fn invalid_group(name: &str, message: impl std::fmt::Display) -> HazardError {
    HazardError::configuration("CONFIG.SOURCE_GROUP", format!("source group '{name}': {message}"))
}

/// Weights of mutually exclusive alternatives must form a probability
/// distribution.
fn check_weights_sum(name: &str, what: &str, weights: &[f64]) -> ConfigResult<()> {
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > PMF_SUM_TOLERANCE {
        return Err(invalid_group(name, format!("{what} add up to {total}, not 1")));
    }
    Ok(())
}

impl SourceGroup {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<Source>,
        src_interdep: Interdependence,
        rup_interdep: Interdependence,
        srcs_weights: Option<Vec<f64>>,
    ) -> ConfigResult<Self> {
        let name = name.into();
        let Some(first) = sources.first() else {
            return Err(invalid_group(&name, "a group needs at least one source"));
        };
        if let Some(other) = sources
            .iter()
            .find(|source| source.tectonic_region_type() != first.tectonic_region_type())
        {
            return Err(invalid_group(
                &name,
                format!(
                    "sources {} and {} belong to different tectonic region types",
                    first.source_id(),
                    other.source_id()
                ),
            ));
        }
        if rup_interdep == Interdependence::Mutex {
            for source in &sources {
                let SourceKind::NonParametric(nonparametric) = source.kind() else {
                    return Err(invalid_group(
                        &name,
                        format!(
                            "mutually exclusive ruptures require non-parametric sources, source {} is {}",
                            source.source_id(),
                            source.kind().name()
                        ),
                    ));
                };
                let weights: Vec<Option<f64>> = nonparametric
                    .ruptures
                    .iter()
                    .map(|rupture| rupture.weight)
                    .collect();
                if weights.iter().any(Option::is_some) {
                    let Some(weights) = weights.into_iter().collect::<Option<Vec<f64>>>() else {
                        return Err(invalid_group(
                            &name,
                            format!(
                                "either all or none of the ruptures of source {} must have a weight",
                                source.source_id()
                            ),
                        ));
                    };
                    let what = format!("rupture weights of source {}", source.source_id());
                    check_weights_sum(&name, &what, &weights)?;
                }
            }
        }
        if let Some(weights) = &srcs_weights {
            if weights.len() != sources.len() {
                return Err(invalid_group(
                    &name,
                    format!("{} weights given for {} sources", weights.len(), sources.len()),
                ));
            }
            if let Some(weight) = weights.iter().find(|weight| !(**weight >= 0.0)) {
                return Err(invalid_group(&name, format!("negative source weight {weight}")));
            }
            if src_interdep == Interdependence::Mutex {
                check_weights_sum(&name, "source weights", weights)?;
            }
        }
        Ok(Self {
            name,
            sources,
            src_interdep,
            rup_interdep,
            srcs_weights,
        })
    }

    /// Group of independent sources with independent ruptures.
    pub fn independent(sources: Vec<Source>) -> ConfigResult<Self> {
        Self::new("", sources, Interdependence::Indep, Interdependence::Indep, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<Source> {
        self.sources
    }

    pub fn tectonic_region_type(&self) -> &str {
        self.sources
            .first()
            .map(Source::tectonic_region_type)
            .unwrap_or_default()
    }

    pub fn src_interdep(&self) -> Interdependence {
        self.src_interdep
    }

    pub fn rup_interdep(&self) -> Interdependence {
        self.rup_interdep
    }

    /// Weight of each source when sources are mutually exclusive; uniform
    /// when not given.
    pub fn source_weights(&self) -> Vec<f64> {
        self.srcs_weights.clone().unwrap_or_else(|| {
            vec![1.0 / self.sources.len() as f64; self.sources.len()]
        })
    }

    pub fn weight(&self) -> f64 {
        self.sources.iter().map(Source::weight).sum()
    }

    pub fn count_ruptures(&self) -> usize {
        self.sources.iter().map(Source::count_ruptures).sum()
    }

    /// Applies [`Source::with_default_temporal_occurrence_model`] to every
    /// member.
    pub fn with_default_temporal_occurrence_model(mut self, tom: TemporalOccurrenceModel) -> Self {
        self.sources = self
            .sources
            .into_iter()
            .map(|source| source.with_default_temporal_occurrence_model(tom))
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::SourceGroup;
    use crate::domain::{HazardErrorCategory, Interdependence};

    fn nonparametric(id: &str, trt: &str) -> String {
        format!(
            r#"{{
                "kind": "nonParametric", "sourceId": "{id}", "tectonicRegionType": "{trt}",
                "ruptures": [{{
                    "mag": 6.0, "rake": 0.0,
                    "hypocenter": {{"lon": 0.0, "lat": 0.05, "depth": 5.0}},
                    "surface": {{
                        "kind": "planar", "strike": 0.0, "dip": 90.0,
                        "topLeft": {{"lon": 0.0, "lat": 0.0, "depth": 0.0}},
                        "topRight": {{"lon": 0.0, "lat": 0.1, "depth": 0.0}},
                        "bottomLeft": {{"lon": 0.0, "lat": 0.0, "depth": 10.0}},
                        "bottomRight": {{"lon": 0.0, "lat": 0.1, "depth": 10.0}}
                    }},
                    "probabilitiesOfOccurrence": [[0.8, 0], [0.2, 1]]
                }}]
            }}"#
        )
    }

    #[test]
    fn mutex_groups_parse_with_weights() {
        let json = format!(
            r#"{{"name": "g", "srcInterdep": "mutex", "rupInterdep": "mutex",
                "srcsWeights": [0.3, 0.7], "sources": [{}, {}]}}"#,
            nonparametric("a", "Active Shallow Crust"),
            nonparametric("b", "Active Shallow Crust"),
        );
        let group: SourceGroup = serde_json::from_str(&json).expect("group");
        assert_eq!(group.src_interdep(), Interdependence::Mutex);
        assert_eq!(group.source_weights(), vec![0.3, 0.7]);
        assert_eq!(group.tectonic_region_type(), "Active Shallow Crust");
        assert_eq!(group.count_ruptures(), 2);
    }

    #[test]
    fn groups_must_share_one_tectonic_region_type() {
        let a = serde_json::from_str(&nonparametric("a", "Active Shallow Crust")).expect("a");
        let b = serde_json::from_str(&nonparametric("b", "Stable Continental Crust")).expect("b");
        let error = SourceGroup::independent(vec![a, b]).expect_err("mixed trts");
        assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.SOURCE_GROUP");
    }

    #[test]
    fn uniform_weights_by_default() {
        let a = serde_json::from_str(&nonparametric("a", "Active Shallow Crust")).expect("a");
        let b = serde_json::from_str(&nonparametric("b", "Active Shallow Crust")).expect("b");
        let group = SourceGroup::independent(vec![a, b]).expect("group");
        assert_eq!(group.source_weights(), vec![0.5, 0.5]);
    }

    fn weighted_ruptures(id: &str, weights: &[Option<f64>]) -> String {
        let ruptures: Vec<String> = weights
            .iter()
            .map(|weight| {
                let weight = weight.map_or(String::new(), |weight| format!(r#""weight": {weight},"#));
                format!(
                    r#"{{
                        "mag": 6.0, "rake": 0.0, {weight}
                        "hypocenter": {{"lon": 0.0, "lat": 0.05, "depth": 5.0}},
                        "surface": {{
                            "kind": "planar", "strike": 0.0, "dip": 90.0,
                            "topLeft": {{"lon": 0.0, "lat": 0.0, "depth": 0.0}},
                            "topRight": {{"lon": 0.0, "lat": 0.1, "depth": 0.0}},
                            "bottomLeft": {{"lon": 0.0, "lat": 0.0, "depth": 10.0}},
                            "bottomRight": {{"lon": 0.0, "lat": 0.1, "depth": 10.0}}
                        }},
                        "probabilitiesOfOccurrence": [[0.8, 0], [0.2, 1]]
                    }}"#
                )
            })
            .collect();
        format!(
            r#"{{"kind": "nonParametric", "sourceId": "{id}",
                "tectonicRegionType": "Active Shallow Crust", "ruptures": [{}]}}"#,
            ruptures.join(",")
        )
    }

    fn mutex_ruptures(weights: &[Option<f64>]) -> Result<SourceGroup, crate::domain::HazardError> {
        let source = serde_json::from_str(&weighted_ruptures("np", weights)).expect("source");
        SourceGroup::new(
            "g",
            vec![source],
            Interdependence::Indep,
            Interdependence::Mutex,
            None,
        )
    }

    #[test]
    fn mutex_rupture_weights_are_all_or_nothing() {
        assert!(mutex_ruptures(&[None, None]).is_ok());
        assert!(mutex_ruptures(&[Some(0.25), Some(0.75)]).is_ok());
        let error = mutex_ruptures(&[Some(0.9), None]).expect_err("mixed weights");
        assert_eq!(error.placeholder(), "CONFIG.SOURCE_GROUP");
        assert!(error.message().contains("all or none"));
    }

    #[test]
    fn mutex_rupture_weights_must_add_up_to_one() {
        let error = mutex_ruptures(&[Some(0.9), Some(0.5)]).expect_err("weights above one");
        assert_eq!(error.category(), HazardErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.SOURCE_GROUP");
        assert!(error.message().contains("rupture weights of source np"));
    }

    #[test]
    fn mutex_source_weights_must_add_up_to_one() {
        let sources = || {
            vec![
                serde_json::from_str(&nonparametric("a", "Active Shallow Crust")).expect("a"),
                serde_json::from_str(&nonparametric("b", "Active Shallow Crust")).expect("b"),
            ]
        };
        let error = SourceGroup::new(
            "g",
            sources(),
            Interdependence::Mutex,
            Interdependence::Indep,
            Some(vec![0.3, 0.3]),
        )
        .expect_err("weights below one");
        assert_eq!(error.placeholder(), "CONFIG.SOURCE_GROUP");
        assert!(error.message().contains("source weights add up to"));
        // independent sources only use the weights for bookkeeping
        assert!(
            SourceGroup::new(
                "g",
                sources(),
                Interdependence::Indep,
                Interdependence::Indep,
                Some(vec![0.3, 0.3]),
            )
            .is_ok()
        );
    }
}
