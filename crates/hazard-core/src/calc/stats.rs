use super::hazard_curve::HazardCurves;
use crate::common::constants::HAZARD_MAP_EPSILON;
use crate::domain::{ComputeResult, ConfigResult, HazardError};
use crate::imt::Imt;
use crate::numerics::{argsort, interp, weighted_mean};
use faer::Mat;

fn check_realizations(curves: &[Mat<f64>], weights: &[f64]) -> ComputeResult<(usize, usize)> {
    let Some(first) = curves.first() else {
        return Err(HazardError::internal(
            "SYS.STATISTICS",
            "statistics need at least one realization",
        ));
    };
    if weights.len() != curves.len() {
        return Err(HazardError::internal(
            "SYS.STATISTICS",
            format!("{} weights for {} realizations", weights.len(), curves.len()),
        ));
    }
    let shape = (first.nrows(), first.ncols());
    if curves
        .iter()
        .any(|curve| (curve.nrows(), curve.ncols()) != shape)
    {
        return Err(HazardError::internal(
            "SYS.STATISTICS",
            "realizations have curves of different shapes",
        ));
    }
    Ok(shape)
}

/// Weighted mean, element by element, of the curves of all realizations.
pub fn mean_curve(curves: &[Mat<f64>], weights: &[f64]) -> ComputeResult<Mat<f64>> {
    let (num_sites, num_levels) = check_realizations(curves, weights)?;
    let mut mean = Mat::zeros(num_sites, num_levels);
    let mut values = vec![0.0; curves.len()];
    for col in 0..num_levels {
        for row in 0..num_sites {
            for (value, curve) in values.iter_mut().zip(curves) {
                *value = curve[(row, col)];
            }
            mean[(row, col)] = weighted_mean(&values, weights).ok_or_else(|| {
                HazardError::internal("SYS.STATISTICS", "realization weights add up to zero")
            })?;
        }
    }
    Ok(mean)
}

pub fn check_quantile(quantile: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&quantile) {
        Ok(())
    } else {
        Err(HazardError::configuration(
            "CONFIG.QUANTILE",
            format!("quantiles must be in [0, 1], got {quantile}"),
        ))
    }
}

/// Weighted quantile, element by element: values are sorted, their
/// normalized weights accumulated, and `quantile` interpolated linearly on
/// the cumulative weights.
pub fn quantile_curve(
    curves: &[Mat<f64>],
    quantile: f64,
    weights: &[f64],
) -> ComputeResult<Mat<f64>> {
    check_quantile(quantile)?;
    let (num_sites, num_levels) = check_realizations(curves, weights)?;
    let total_weight: f64 = weights.iter().sum();
    if !(total_weight > 0.0) {
        return Err(HazardError::internal(
            "SYS.STATISTICS",
            "realization weights add up to zero",
        ));
    }
    let mut result = Mat::zeros(num_sites, num_levels);
    let mut values = vec![0.0; curves.len()];
    for col in 0..num_levels {
        for row in 0..num_sites {
            for (value, curve) in values.iter_mut().zip(curves) {
                *value = curve[(row, col)];
            }
            let order = argsort(&values);
            let sorted: Vec<f64> = order.iter().map(|index| values[*index]).collect();
            if sorted.len() == 1 {
                result[(row, col)] = sorted[0];
                continue;
            }
            let cumulative: Vec<f64> = order
                .iter()
                .scan(0.0, |acc, index| {
                    *acc += weights[*index] / total_weight;
                    Some(*acc)
                })
                .collect();
            result[(row, col)] =
                interp(quantile, &cumulative, &sorted).ok_or_else(|| {
                    HazardError::internal("SYS.STATISTICS", "negative realization weight")
                })?;
        }
    }
    Ok(result)
}

/// Intensity levels with the given probabilities of exceedance, one row per
/// curve and one column per poe.
///
/// Interpolation is linear in log(poe)-log(iml). Poes below
/// [`HAZARD_MAP_EPSILON`] are clamped to it; a poe above the highest value
/// of a curve maps to 0.
pub fn compute_hazard_maps(
    curves: &Mat<f64>,
    imls: &[f64],
    poes: &[f64],
) -> ComputeResult<Mat<f64>> {
    if curves.ncols() != imls.len() {
        return Err(HazardError::internal(
            "SYS.CURVES_SHAPE",
            format!(
                "the curves have {} levels, {} were passed",
                curves.ncols(),
                imls.len()
            ),
        ));
    }
    let log_imls: Vec<f64> = imls.iter().rev().map(|iml| iml.ln()).collect();
    let mut maps = Mat::zeros(curves.nrows(), poes.len());
    for row in 0..curves.nrows() {
        let cutoff: Vec<f64> = (0..imls.len())
            .rev()
            .map(|col| curves[(row, col)].max(HAZARD_MAP_EPSILON))
            .collect();
        let log_cutoff: Vec<f64> = cutoff.iter().map(|poe| poe.ln()).collect();
        let highest = cutoff.last().copied().unwrap_or(HAZARD_MAP_EPSILON);
        for (col, poe) in poes.iter().enumerate() {
            if *poe > highest {
                continue;
            }
            let log_iml = if log_imls.len() == 1 {
                log_imls[0]
            } else {
                interp(poe.ln(), &log_cutoff, &log_imls).ok_or_else(|| {
                    HazardError::computation(
                        "RUN.HAZARD_MAP",
                        format!("hazard curve of site #{row} is not monotonic"),
                    )
                })?
            };
            maps[(row, col)] = log_iml.exp();
        }
    }
    Ok(maps)
}

/// Hazard maps of every IMT of a set of curves.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardMaps {
    poes: Vec<f64>,
    maps: Vec<(Imt, Mat<f64>)>,
}

impl HazardMaps {
    pub fn from_curves(curves: &HazardCurves, poes: &[f64]) -> ComputeResult<Self> {
        let maps = curves
            .imtls()
            .iter()
            .map(|(imt, imls)| -> ComputeResult<(Imt, Mat<f64>)> {
                let field = curves.field(imt).ok_or_else(|| {
                    HazardError::internal("SYS.CURVES_SHAPE", format!("no curves for {imt}"))
                })?;
                Ok((*imt, compute_hazard_maps(&field, imls, poes)?))
            })
            .collect::<ComputeResult<Vec<_>>>()?;
        Ok(Self {
            poes: poes.to_vec(),
            maps,
        })
    }

    pub fn poes(&self) -> &[f64] {
        &self.poes
    }

    pub fn get(&self, imt: &Imt) -> Option<&Mat<f64>> {
        self.maps
            .iter()
            .find(|(candidate, _)| candidate == imt)
            .map(|(_, map)| map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Imt, &Mat<f64>)> {
        self.maps.iter().map(|(imt, map)| (imt, map))
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_hazard_maps, mean_curve, quantile_curve};
    use faer::Mat;

    fn row(values: &[f64]) -> Mat<f64> {
        Mat::from_fn(1, values.len(), |_, col| values[col])
    }

    #[test]
    fn mean_is_weighted() {
        let curves = [row(&[0.2, 0.1]), row(&[0.6, 0.3])];
        let mean = mean_curve(&curves, &[0.75, 0.25]).expect("mean");
        assert!((mean[(0, 0)] - 0.3).abs() < 1.0e-12);
        assert!((mean[(0, 1)] - 0.15).abs() < 1.0e-12);
    }

    #[test]
    fn quantiles_interpolate_on_cumulative_weights() {
        let curves = [row(&[0.3]), row(&[0.1]), row(&[0.2])];
        let weights = [1.0, 1.0, 2.0];
        // sorted 0.1 (cum 0.25), 0.2 (cum 0.75), 0.3 (cum 1.0)
        let median = quantile_curve(&curves, 0.5, &weights).expect("median");
        assert!((median[(0, 0)] - 0.15).abs() < 1.0e-12);
        let low = quantile_curve(&curves, 0.1, &weights).expect("low");
        assert_eq!(low[(0, 0)], 0.1);
        let high = quantile_curve(&curves, 1.0, &weights).expect("high");
        assert_eq!(high[(0, 0)], 0.3);
        assert_eq!(
            quantile_curve(&curves, 1.5, &weights)
                .expect_err("out of range")
                .placeholder(),
            "CONFIG.QUANTILE"
        );
    }

    #[test]
    fn hazard_maps_interpolate_in_log_space() {
        let imls = [0.1, 0.2, 0.4];
        let curves = row(&[0.1, 0.01, 0.001]);
        let maps = compute_hazard_maps(&curves, &imls, &[0.01, 0.5, 0.0316227766]).expect("maps");
        assert!((maps[(0, 0)] - 0.2).abs() < 1.0e-12);
        assert_eq!(maps[(0, 1)], 0.0);
        let between = maps[(0, 2)];
        assert!((between - (0.1f64 * 0.2).sqrt()).abs() < 1.0e-6);
    }

    #[test]
    fn zero_curves_give_zero_maps() {
        let maps = compute_hazard_maps(&row(&[0.0, 0.0]), &[0.1, 0.2], &[0.1]).expect("maps");
        assert_eq!(maps[(0, 0)], 0.0);
        assert!(compute_hazard_maps(&row(&[0.0]), &[0.1, 0.2], &[0.1]).is_err());
    }
}
