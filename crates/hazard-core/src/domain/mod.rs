pub mod errors;

pub use errors::{
    ComputeResult, ConfigResult, ExitStatusMapping, HazardError, HazardErrorCategory,
    HazardResult, SourceLocation,
};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const ACTIVE_SHALLOW_CRUST: &str = "Active Shallow Crust";
pub const STABLE_CONTINENTAL: &str = "Stable Continental Crust";
pub const SUBDUCTION_INTERFACE: &str = "Subduction Interface";
pub const SUBDUCTION_INTRASLAB: &str = "Subduction IntraSlab";
pub const VOLCANIC: &str = "Volcanic";

/// How the members of a source group (or the ruptures of a source) relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interdependence {
    #[default]
    Indep,
    Mutex,
}

impl Interdependence {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Indep => "indep",
            Self::Mutex => "mutex",
        }
    }

    pub const fn is_independent(self) -> bool {
        matches!(self, Self::Indep)
    }
}

impl Display for Interdependence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
