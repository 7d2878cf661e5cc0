//! Ground shaking intensity models.
//!
//! A GSIM turns [`Contexts`] into a mean and a total standard deviation per
//! site; [`get_poes`] turns those into probabilities of exceeding a set of
//! intensity levels under a (possibly truncated) normal distribution.

mod akkar_bommer_2010;
mod boore_atkinson_2008;
pub mod coeffs;
mod registry;

pub use akkar_bommer_2010::AkkarBommer2010;
pub use boore_atkinson_2008::BooreAtkinson2008;
pub use coeffs::{Coeffs, CoeffsTable, CoeffsTableError};
pub use registry::{GsimConstructor, GsimRegistry};

use crate::contexts::Contexts;
use crate::domain::{ComputeResult, ConfigResult, HazardError};
use crate::imt::Imt;
use crate::numerics::{norm_sf, truncnorm_sf};
use faer::Mat;
use std::fmt::Debug;

/// Scale on which a model's mean and standard deviation live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntensityDistribution {
    /// Ground-motion prediction equations: ln of the intensity is normal.
    #[default]
    LogNormal,
    /// Intensity prediction equations: the intensity itself is normal.
    Normal,
}

impl IntensityDistribution {
    pub fn to_distribution_value(self, level: f64) -> f64 {
        match self {
            Self::LogNormal => level.ln(),
            Self::Normal => level,
        }
    }
}

pub trait Gsim: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn requires_sites_parameters(&self) -> &'static [&'static str];

    fn requires_rupture_parameters(&self) -> &'static [&'static str];

    fn requires_distances(&self) -> &'static [&'static str];

    fn supports_imt(&self, imt: &Imt) -> bool;

    fn distribution(&self) -> IntensityDistribution {
        IntensityDistribution::LogNormal
    }

    /// Mean and total standard deviation, one value per site in
    /// `contexts.sites`, on the scale given by [`Gsim::distribution`].
    fn mean_and_stddev(
        &self,
        contexts: &Contexts,
        imt: &Imt,
    ) -> ComputeResult<(Vec<f64>, Vec<f64>)>;
}

pub fn check_truncation_level(truncation_level: Option<f64>) -> ConfigResult<()> {
    match truncation_level {
        Some(level) if !(level >= 0.0) => Err(HazardError::configuration(
            "CONFIG.TRUNCATION_LEVEL",
            format!("truncation level must be zero, positive number or None, got {level}"),
        )),
        _ => Ok(()),
    }
}

/// Probabilities of exceeding each of `levels`, as a sites x levels matrix.
///
/// `truncation_level == Some(0.0)` collapses the distribution onto its mean:
/// a level is exceeded with probability 1 when it lies at or below the
/// mean and 0 otherwise. Sites whose standard deviation is not positive get
/// the same step treatment.
pub fn get_poes(
    gsim: &dyn Gsim,
    contexts: &Contexts,
    imt: &Imt,
    levels: &[f64],
    truncation_level: Option<f64>,
) -> ComputeResult<Mat<f64>> {
    check_truncation_level(truncation_level)?;
    let (mean, stddev) = gsim.mean_and_stddev(contexts, imt)?;
    let num_sites = contexts.sites.len();
    if mean.len() != num_sites || stddev.len() != num_sites {
        return Err(HazardError::internal(
            "SYS.GSIM_SHAPE",
            format!(
                "{} returned {} means and {} stddevs for {num_sites} sites",
                gsim.name(),
                mean.len(),
                stddev.len()
            ),
        ));
    }
    for (what, values) in [("mean", &mean), ("standard deviation", &stddev)] {
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(HazardError::computation(
                "RUN.GSIM",
                format!(
                    "{} produced a non-finite {what} for {imt} at site #{}",
                    gsim.name(),
                    contexts.sites.sids()[index]
                ),
            ));
        }
    }

    let distribution = gsim.distribution();
    let values: Vec<f64> = levels
        .iter()
        .map(|level| distribution.to_distribution_value(*level))
        .collect();
    Ok(Mat::from_fn(num_sites, levels.len(), |site, column| {
        let (mean, stddev) = (mean[site], stddev[site]);
        let value = values[column];
        match truncation_level {
            Some(level) if level == 0.0 => f64::from(u8::from(value <= mean)),
            _ if stddev <= 0.0 => f64::from(u8::from(value <= mean)),
            None => norm_sf((value - mean) / stddev),
            Some(level) => truncnorm_sf(level, (value - mean) / stddev),
        }
    }))
}

/// `log10` of a quantity expressed in g converted to the natural log of the
/// same quantity in cm/s².
pub(crate) fn ln_g_from_log10_cms2(log10_cms2: f64) -> f64 {
    (10.0_f64.powf(log10_cms2 - 2.0) / crate::common::constants::STANDARD_GRAVITY).ln()
}
