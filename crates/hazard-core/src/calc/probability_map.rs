use crate::domain::{ComputeResult, HazardError};
use faer::Mat;

/// Probabilities of no exceedance, one `sites x levels` matrix per GSIM.
///
/// Sites are indexed over the complete collection and levels over the flat
/// level axis of the calculation's [`crate::imt::Imtls`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMap {
    pne: Vec<Mat<f64>>,
}

impl ProbabilityMap {
    /// The identity of [`Self::combine`]: no exceedance anywhere.
    pub fn acc0(num_sites: usize, num_levels: usize, num_gsims: usize) -> Self {
        Self::filled(num_sites, num_levels, num_gsims, 1.0)
    }

    pub fn filled(num_sites: usize, num_levels: usize, num_gsims: usize, value: f64) -> Self {
        Self {
            pne: (0..num_gsims)
                .map(|_| Mat::from_fn(num_sites, num_levels, |_, _| value))
                .collect(),
        }
    }

    /// Builds a map from probabilities of exceedance.
    pub fn from_poes(poes: &[Mat<f64>]) -> Self {
        Self {
            pne: poes
                .iter()
                .map(|poe| Mat::from_fn(poe.nrows(), poe.ncols(), |row, col| 1.0 - poe[(row, col)]))
                .collect(),
        }
    }

    pub fn num_gsims(&self) -> usize {
        self.pne.len()
    }

    pub fn num_sites(&self) -> usize {
        self.pne.first().map_or(0, |pne| pne.nrows())
    }

    pub fn num_levels(&self) -> usize {
        self.pne.first().map_or(0, |pne| pne.ncols())
    }

    pub fn pne(&self, gsim: usize) -> &Mat<f64> {
        &self.pne[gsim]
    }

    fn check_shape(&self, gsim: usize, values: &Mat<f64>) -> ComputeResult<()> {
        let Some(pne) = self.pne.get(gsim) else {
            return Err(HazardError::internal(
                "SYS.PMAP_SHAPE",
                format!("gsim #{gsim} is out of range for {} gsims", self.pne.len()),
            ));
        };
        if pne.nrows() != values.nrows() || pne.ncols() != values.ncols() {
            return Err(HazardError::internal(
                "SYS.PMAP_SHAPE",
                format!(
                    "cannot fold a {}x{} matrix into a {}x{} probability map",
                    values.nrows(),
                    values.ncols(),
                    pne.nrows(),
                    pne.ncols()
                ),
            ));
        }
        Ok(())
    }

    /// Folds an independent contribution in: `pne *= values`.
    pub fn multiply(&mut self, gsim: usize, values: &Mat<f64>) -> ComputeResult<()> {
        self.check_shape(gsim, values)?;
        let pne = &mut self.pne[gsim];
        for col in 0..pne.ncols() {
            for row in 0..pne.nrows() {
                pne[(row, col)] *= values[(row, col)];
            }
        }
        Ok(())
    }

    /// Adds a weighted mutually exclusive contribution: `pne += weight * values`.
    pub fn add_weighted(&mut self, gsim: usize, values: &Mat<f64>, weight: f64) -> ComputeResult<()> {
        self.check_shape(gsim, values)?;
        let pne = &mut self.pne[gsim];
        for col in 0..pne.ncols() {
            for row in 0..pne.nrows() {
                pne[(row, col)] += weight * values[(row, col)];
            }
        }
        Ok(())
    }

    /// Adds `weight` everywhere, the contribution of a mutually exclusive
    /// rupture that affects no site.
    pub fn add_constant(&mut self, weight: f64) {
        for pne in &mut self.pne {
            for col in 0..pne.ncols() {
                for row in 0..pne.nrows() {
                    pne[(row, col)] += weight;
                }
            }
        }
    }

    pub fn combine_in_place(&mut self, other: &ProbabilityMap) -> ComputeResult<()> {
        if other.num_gsims() != self.num_gsims() {
            return Err(HazardError::internal(
                "SYS.PMAP_SHAPE",
                format!(
                    "cannot combine probability maps over {} and {} gsims",
                    self.num_gsims(),
                    other.num_gsims()
                ),
            ));
        }
        for (gsim, values) in other.pne.iter().enumerate() {
            self.multiply(gsim, values)?;
        }
        Ok(())
    }

    /// Joint no-exceedance of two independent contributions. Associative and
    /// commutative up to floating-point reassociation.
    pub fn combine(&self, other: &ProbabilityMap) -> ComputeResult<ProbabilityMap> {
        let mut combined = self.clone();
        combined.combine_in_place(other)?;
        Ok(combined)
    }

    /// Probabilities of exceedance, `1 - pne`, for one GSIM.
    pub fn to_curves(&self, gsim: usize) -> Mat<f64> {
        let pne = &self.pne[gsim];
        Mat::from_fn(pne.nrows(), pne.ncols(), |row, col| 1.0 - pne[(row, col)])
    }
}
