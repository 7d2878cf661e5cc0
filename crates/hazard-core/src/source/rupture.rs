use crate::geo::{Point, Surface};
use crate::tom::Occurrence;
use serde::{Deserialize, Serialize};

/// Fault plane orientation, all in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NodalPlane {
    pub strike: f64,
    pub dip: f64,
    pub rake: f64,
}

impl NodalPlane {
    pub const fn new(strike: f64, dip: f64, rake: f64) -> Self {
        Self { strike, dip, rake }
    }
}

/// One earthquake a source can produce. Ruptures are plain values and do
/// not borrow from the source that generated them.
#[derive(Debug, Clone, PartialEq)]
pub struct Rupture {
    mag: f64,
    rake: f64,
    tectonic_region_type: String,
    hypocenter: Point,
    surface: Surface,
    occurrence: Occurrence,
    weight: Option<f64>,
}

impl Rupture {
    pub fn new(
        mag: f64,
        rake: f64,
        tectonic_region_type: impl Into<String>,
        hypocenter: Point,
        surface: Surface,
        occurrence: Occurrence,
    ) -> Self {
        Self {
            mag,
            rake,
            tectonic_region_type: tectonic_region_type.into(),
            hypocenter,
            surface,
            occurrence,
            weight: None,
        }
    }

    /// Weight used when the ruptures of a source are mutually exclusive.
    pub fn with_weight(mut self, weight: Option<f64>) -> Self {
        self.weight = weight;
        self
    }

    pub fn mag(&self) -> f64 {
        self.mag
    }

    pub fn rake(&self) -> f64 {
        self.rake
    }

    pub fn tectonic_region_type(&self) -> &str {
        &self.tectonic_region_type
    }

    pub fn hypocenter(&self) -> Point {
        self.hypocenter
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn occurrence(&self) -> &Occurrence {
        &self.occurrence
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    pub fn probability_no_exceedance(&self, poe: f64) -> f64 {
        self.occurrence.probability_no_exceedance(poe)
    }
}
