use crate::common::constants::PMF_SUM_TOLERANCE;
use crate::domain::HazardError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PmfError {
    #[error("probability mass function cannot be empty")]
    Empty,
    #[error("probability {0} is outside [0, 1]")]
    OutOfRange(f64),
    #[error("probabilities must sum to 1, got {0}")]
    BadSum(f64),
}

impl From<PmfError> for HazardError {
    fn from(error: PmfError) -> Self {
        HazardError::configuration("CONFIG.PMF", error.to_string())
    }
}

/// Discrete probability mass function over values of `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, T)>", into = "Vec<(f64, T)>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct Pmf<T> {
    data: Vec<(f64, T)>,
}

impl<T> Pmf<T> {
    pub fn new(data: Vec<(f64, T)>) -> Result<Self, PmfError> {
        if data.is_empty() {
            return Err(PmfError::Empty);
        }
        if let Some((probability, _)) = data
            .iter()
            .find(|(probability, _)| !(0.0..=1.0).contains(probability))
        {
            return Err(PmfError::OutOfRange(*probability));
        }
        let total: f64 = data.iter().map(|(probability, _)| probability).sum();
        if (total - 1.0).abs() > PMF_SUM_TOLERANCE {
            return Err(PmfError::BadSum(total));
        }
        Ok(Self { data })
    }

    pub fn data(&self) -> &[(f64, T)] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> {
        self.data.iter().map(|(probability, value)| (*probability, value))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> TryFrom<Vec<(f64, T)>> for Pmf<T> {
    type Error = PmfError;

    fn try_from(data: Vec<(f64, T)>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl<T> From<Pmf<T>> for Vec<(f64, T)> {
    fn from(pmf: Pmf<T>) -> Self {
        pmf.data
    }
}
