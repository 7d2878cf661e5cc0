//! Temporal occurrence models: how an occurrence rate turns into
//! probabilities over an investigation time.

use crate::domain::{ConfigResult, HazardError};
use crate::pmf::Pmf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemporalOccurrenceModel {
    #[serde(rename_all = "camelCase")]
    Poisson { time_span: f64 },
    #[serde(rename_all = "camelCase")]
    NegativeBinomial { time_span: f64, alpha: f64 },
}

impl TemporalOccurrenceModel {
    pub fn poisson(time_span: f64) -> ConfigResult<Self> {
        let tom = Self::Poisson { time_span };
        tom.validate()?;
        Ok(tom)
    }

    pub fn negative_binomial(time_span: f64, alpha: f64) -> ConfigResult<Self> {
        let tom = Self::NegativeBinomial { time_span, alpha };
        tom.validate()?;
        Ok(tom)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.time_span() > 0.0) {
            return Err(HazardError::configuration(
                "CONFIG.TOM",
                format!("time span must be positive, got {}", self.time_span()),
            ));
        }
        if let Self::NegativeBinomial { alpha, .. } = self {
            if !(*alpha > 0.0) {
                return Err(HazardError::configuration(
                    "CONFIG.TOM",
                    format!("negative binomial dispersion must be positive, got {alpha}"),
                ));
            }
        }
        Ok(())
    }

    pub fn time_span(&self) -> f64 {
        match self {
            Self::Poisson { time_span } | Self::NegativeBinomial { time_span, .. } => *time_span,
        }
    }

    pub fn probability_one_or_more(&self, rate: f64) -> f64 {
        match *self {
            Self::Poisson { time_span } => -(-rate * time_span).exp_m1(),
            Self::NegativeBinomial { time_span, alpha } => {
                1.0 - (1.0 + alpha * rate * time_span).powf(-1.0 / alpha)
            }
        }
    }

    pub fn probability_n_occurrences(&self, rate: f64, n: u32) -> f64 {
        match *self {
            Self::Poisson { time_span } => {
                let mean = rate * time_span;
                let mut probability = (-mean).exp();
                for k in 1..=n {
                    probability *= mean / f64::from(k);
                }
                probability
            }
            Self::NegativeBinomial { time_span, alpha } => {
                let mean = rate * time_span;
                let shape = 1.0 / alpha;
                let success = shape / (shape + mean);
                let mut probability = success.powf(shape);
                for k in 0..n {
                    probability *= (shape + f64::from(k)) / f64::from(k + 1) * (1.0 - success);
                }
                probability
            }
        }
    }

    /// Probability that a rupture with the given annual rate, causing
    /// exceedance with probability `poe` on each occurrence, never causes
    /// exceedance during the time span.
    pub fn probability_no_exceedance(&self, rate: f64, poe: f64) -> f64 {
        match *self {
            Self::Poisson { time_span } => (-rate * time_span * poe).exp(),
            Self::NegativeBinomial { time_span, alpha } => {
                (1.0 + alpha * rate * time_span * poe).powf(-1.0 / alpha)
            }
        }
    }
}

/// How often a rupture happens: a rate under a temporal model, or an
/// explicit distribution over the number of occurrences in the time span.
#[derive(Debug, Clone, PartialEq)]
pub enum Occurrence {
    Parametric {
        rate: f64,
        tom: TemporalOccurrenceModel,
    },
    NonParametric(Pmf<u32>),
}

impl Occurrence {
    pub fn probability_no_exceedance(&self, poe: f64) -> f64 {
        match self {
            Self::Parametric { rate, tom } => tom.probability_no_exceedance(*rate, poe),
            Self::NonParametric(pmf) => pmf
                .iter()
                .map(|(probability, count)| probability * (1.0 - poe).powi(*count as i32))
                .sum(),
        }
    }

    pub fn probability_one_or_more(&self) -> f64 {
        match self {
            Self::Parametric { rate, tom } => tom.probability_one_or_more(*rate),
            Self::NonParametric(pmf) => pmf
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(probability, _)| probability)
                .sum(),
        }
    }

    /// Annual rate, when the occurrence is parametric.
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Parametric { rate, .. } => Some(*rate),
            Self::NonParametric(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Occurrence, TemporalOccurrenceModel};
    use crate::pmf::Pmf;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1.0e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn poisson_probabilities() {
        let tom = TemporalOccurrenceModel::poisson(50.0).expect("tom");
        assert_close(tom.probability_one_or_more(0.01), 1.0 - (-0.5_f64).exp());
        assert_close(tom.probability_n_occurrences(0.01, 0), (-0.5_f64).exp());
        assert_close(
            tom.probability_n_occurrences(0.01, 2),
            (-0.5_f64).exp() * 0.25 / 2.0,
        );
        let p_occ = tom.probability_one_or_more(0.01);
        assert_close(
            tom.probability_no_exceedance(0.01, 0.3),
            (1.0 - p_occ).powf(0.3),
        );
        assert_close(tom.probability_no_exceedance(0.01, 0.0), 1.0);
    }

    #[test]
    fn negative_binomial_tends_to_poisson() {
        let poisson = TemporalOccurrenceModel::poisson(50.0).expect("poisson");
        let overdispersed =
            TemporalOccurrenceModel::negative_binomial(50.0, 1.0e-9).expect("negative binomial");
        let expected = poisson.probability_no_exceedance(0.02, 0.4);
        let actual = overdispersed.probability_no_exceedance(0.02, 0.4);
        assert!((actual - expected).abs() < 1.0e-6);
        let dispersed = TemporalOccurrenceModel::negative_binomial(50.0, 2.0).expect("nb");
        assert!(dispersed.probability_no_exceedance(0.02, 0.4) > expected);
        let total: f64 = (0..200)
            .map(|n| dispersed.probability_n_occurrences(0.02, n))
            .sum();
        assert!((total - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn invalid_models_are_rejected() {
        assert!(TemporalOccurrenceModel::poisson(0.0).is_err());
        assert!(TemporalOccurrenceModel::negative_binomial(1.0, 0.0).is_err());
        let parsed: TemporalOccurrenceModel =
            serde_json::from_str(r#"{"kind": "poisson", "timeSpan": 1.0}"#).expect("tom");
        assert_eq!(parsed, TemporalOccurrenceModel::Poisson { time_span: 1.0 });
    }

    #[test]
    fn non_parametric_occurrence_weights_counts() {
        let pmf = Pmf::new(vec![(0.7, 0_u32), (0.2, 1), (0.1, 2)]).expect("pmf");
        let occurrence = Occurrence::NonParametric(pmf);
        let poe: f64 = 0.5;
        assert_close(
            occurrence.probability_no_exceedance(poe),
            0.7 + 0.2 * 0.5 + 0.1 * 0.25,
        );
        assert_close(occurrence.probability_one_or_more(), 0.3);
        assert_eq!(occurrence.rate(), None);
    }
}
