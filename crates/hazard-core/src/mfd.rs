//! Magnitude-frequency distributions.

use crate::domain::HazardError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MfdError {
    #[error("bin width must be positive, got {0}")]
    BinWidth(f64),
    #[error("minimum magnitude must be non-negative, got {0}")]
    MinMagnitude(f64),
    #[error("maximum magnitude must be at least one bin above the minimum magnitude")]
    MagnitudeRange,
    #[error("b value must be positive, got {0}")]
    BValue(f64),
    #[error("{0}")]
    Rates(String),
}

impl From<MfdError> for HazardError {
    fn from(error: MfdError) -> Self {
        HazardError::configuration("CONFIG.MFD", error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mfd {
    /// Doubly truncated Gutenberg-Richter, `log10(N) = a - b M`.
    #[serde(rename_all = "camelCase")]
    TruncatedGr {
        a_val: f64,
        b_val: f64,
        min_mag: f64,
        max_mag: f64,
        bin_width: f64,
    },
    #[serde(rename_all = "camelCase")]
    EvenlyDiscretized {
        min_mag: f64,
        bin_width: f64,
        occurrence_rates: Vec<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Arbitrary {
        magnitudes: Vec<f64>,
        occurrence_rates: Vec<f64>,
    },
}

fn check_rates(rates: &[f64]) -> Result<(), MfdError> {
    if rates.is_empty() {
        return Err(MfdError::Rates(
            "at least one occurrence rate is required".to_string(),
        ));
    }
    if rates.iter().any(|rate| !(*rate >= 0.0)) {
        return Err(MfdError::Rates(
            "occurrence rates must be non-negative".to_string(),
        ));
    }
    if rates.iter().all(|rate| *rate == 0.0) {
        return Err(MfdError::Rates(
            "at least one occurrence rate must be positive".to_string(),
        ));
    }
    Ok(())
}

impl Mfd {
    pub fn check_constraints(&self) -> Result<(), MfdError> {
        match self {
            Self::TruncatedGr {
                b_val,
                min_mag,
                max_mag,
                bin_width,
                ..
            } => {
                if !(*bin_width > 0.0) {
                    return Err(MfdError::BinWidth(*bin_width));
                }
                if !(*min_mag >= 0.0) {
                    return Err(MfdError::MinMagnitude(*min_mag));
                }
                if !(*max_mag >= *min_mag + *bin_width) {
                    return Err(MfdError::MagnitudeRange);
                }
                if !(*b_val > 0.0) {
                    return Err(MfdError::BValue(*b_val));
                }
                Ok(())
            }
            Self::EvenlyDiscretized {
                min_mag,
                bin_width,
                occurrence_rates,
            } => {
                if !(*bin_width > 0.0) {
                    return Err(MfdError::BinWidth(*bin_width));
                }
                if !(*min_mag >= 0.0) {
                    return Err(MfdError::MinMagnitude(*min_mag));
                }
                check_rates(occurrence_rates)
            }
            Self::Arbitrary {
                magnitudes,
                occurrence_rates,
            } => {
                if magnitudes.len() != occurrence_rates.len() {
                    return Err(MfdError::Rates(format!(
                        "{} magnitudes given for {} occurrence rates",
                        magnitudes.len(),
                        occurrence_rates.len()
                    )));
                }
                check_rates(occurrence_rates)
            }
        }
    }

    /// `(magnitude, annual rate)` pairs, one per bin centre.
    pub fn annual_occurrence_rates(&self) -> Vec<(f64, f64)> {
        match self {
            Self::TruncatedGr {
                a_val,
                b_val,
                bin_width,
                ..
            } => {
                let (min_mag, num_bins) = self.truncated_gr_bins();
                let half = bin_width / 2.0;
                (0..num_bins)
                    .map(|index| {
                        let mag = min_mag + *bin_width * index as f64;
                        let rate = 10f64.powf(a_val - b_val * (mag - half))
                            - 10f64.powf(a_val - b_val * (mag + half));
                        (mag, rate)
                    })
                    .collect()
            }
            Self::EvenlyDiscretized {
                min_mag,
                bin_width,
                occurrence_rates,
            } => occurrence_rates
                .iter()
                .enumerate()
                .map(|(index, rate)| (min_mag + bin_width * index as f64, *rate))
                .collect(),
            Self::Arbitrary {
                magnitudes,
                occurrence_rates,
            } => magnitudes
                .iter()
                .copied()
                .zip(occurrence_rates.iter().copied())
                .collect(),
        }
    }

    /// Centre of the first bin and the number of bins, with both edges
    /// rounded to the bin width.
    fn truncated_gr_bins(&self) -> (f64, usize) {
        let Self::TruncatedGr {
            min_mag,
            max_mag,
            bin_width,
            ..
        } = self
        else {
            return (0.0, 0);
        };
        let mut low = (min_mag / bin_width).round() * bin_width;
        let mut high = (max_mag / bin_width).round() * bin_width;
        if low != high {
            low += bin_width / 2.0;
            high -= bin_width / 2.0;
        }
        let num_bins = ((high - low) / bin_width).round() as usize + 1;
        (low, num_bins)
    }

    pub fn min_max_mag(&self) -> (f64, f64) {
        let rates = self.annual_occurrence_rates();
        rates.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(low, high), (mag, _)| (low.min(*mag), high.max(*mag)),
        )
    }

    /// Copy with every rate multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Mfd {
        let rates = self
            .annual_occurrence_rates()
            .into_iter()
            .map(|(mag, rate)| (mag, rate * factor))
            .unzip();
        let (magnitudes, occurrence_rates): (Vec<f64>, Vec<f64>) = rates;
        Self::Arbitrary {
            magnitudes,
            occurrence_rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mfd, MfdError};

    fn gr(min_mag: f64, max_mag: f64, bin_width: f64) -> Mfd {
        Mfd::TruncatedGr {
            a_val: 2.0,
            b_val: 1.0,
            min_mag,
            max_mag,
            bin_width,
        }
    }

    #[test]
    fn truncated_gr_single_bin() {
        let rates = gr(5.0, 6.0, 1.0).annual_occurrence_rates();
        assert_eq!(rates.len(), 1);
        assert!((rates[0].0 - 5.5).abs() < 1.0e-12);
        assert!((rates[0].1 - 0.0009).abs() < 1.0e-15);
    }

    #[test]
    fn truncated_gr_bins_cover_the_range() {
        let mfd = Mfd::TruncatedGr {
            a_val: 3.1,
            b_val: 0.9,
            min_mag: 5.0,
            max_mag: 6.5,
            bin_width: 0.1,
        };
        mfd.check_constraints().expect("valid");
        let rates = mfd.annual_occurrence_rates();
        assert_eq!(rates.len(), 15);
        assert!((rates[0].0 - 5.05).abs() < 1.0e-9);
        assert!((rates[14].0 - 6.45).abs() < 1.0e-9);
        let total: f64 = rates.iter().map(|(_, rate)| rate).sum();
        let expected = 10f64.powf(3.1 - 0.9 * 5.0) - 10f64.powf(3.1 - 0.9 * 6.5);
        assert!((total - expected).abs() < 1.0e-12);
        assert!(rates.windows(2).all(|pair| pair[0].1 > pair[1].1));
    }

    #[test]
    fn constraints_are_checked() {
        assert_eq!(gr(5.0, 6.0, 0.0).check_constraints(), Err(MfdError::BinWidth(0.0)));
        assert_eq!(
            gr(5.0, 5.05, 0.1).check_constraints(),
            Err(MfdError::MagnitudeRange)
        );
        let arbitrary = Mfd::Arbitrary {
            magnitudes: vec![5.0, 6.0],
            occurrence_rates: vec![0.1],
        };
        assert!(arbitrary.check_constraints().is_err());
        let zero = Mfd::EvenlyDiscretized {
            min_mag: 5.0,
            bin_width: 0.1,
            occurrence_rates: vec![0.0, 0.0],
        };
        assert!(zero.check_constraints().is_err());
    }

    #[test]
    fn evenly_discretized_and_scaled_rates() {
        let mfd: Mfd = serde_json::from_str(
            r#"{"kind": "evenlyDiscretized", "minMag": 5.0, "binWidth": 0.5, "occurrenceRates": [0.2, 0.1]}"#,
        )
        .expect("mfd");
        assert_eq!(mfd.annual_occurrence_rates(), vec![(5.0, 0.2), (5.5, 0.1)]);
        assert_eq!(mfd.min_max_mag(), (5.0, 5.5));
        let scaled = mfd.scaled(0.5).annual_occurrence_rates();
        assert_eq!(scaled, vec![(5.0, 0.1), (5.5, 0.05)]);
    }
}
