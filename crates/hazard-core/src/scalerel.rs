use serde::{Deserialize, Serialize};

/// Magnitude-area scaling relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ScalingRelationship {
    /// Wells and Coppersmith (1994), rake dependent.
    #[serde(rename = "WC1994")]
    Wc1994,
    /// `log10(A) = M - 4`, used by the PEER verification tests.
    #[serde(rename = "PeerMSR")]
    PeerMsr,
}

impl ScalingRelationship {
    /// Median rupture area in km².
    pub fn median_area(&self, mag: f64, rake: Option<f64>) -> f64 {
        match self {
            Self::PeerMsr => 10f64.powf(mag - 4.0),
            Self::Wc1994 => match rake {
                None => 10f64.powf(-3.49 + 0.91 * mag),
                Some(rake) if (-45.0..=45.0).contains(&rake) || rake.abs() >= 135.0 => {
                    10f64.powf(-3.42 + 0.90 * mag)
                }
                Some(rake) if rake > 0.0 => 10f64.powf(-3.99 + 0.98 * mag),
                Some(_) => 10f64.powf(-2.87 + 0.82 * mag),
            },
        }
    }
}
