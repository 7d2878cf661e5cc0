//! Classical probabilistic seismic hazard analysis.
//!
//! Sources generate ruptures, ruptures and sites give contexts, GSIMs turn
//! contexts into probabilities of exceedance, and [`calc`] folds them into
//! hazard curves in no-exceedance space.

pub mod calc;
pub mod common;
pub mod contexts;
pub mod domain;
pub mod export;
pub mod filters;
pub mod geo;
pub mod gsim;
pub mod imt;
pub mod mfd;
pub mod numerics;
pub mod pmf;
pub mod scalerel;
pub mod site;
pub mod source;
pub mod tom;

pub use calc::{ClassicalCalculation, ClassicalOutput, HazardCurves, calc_hazard_curves};
pub use common::config::{JobConfig, JobConfigError, load_job_config};
pub use domain::{HazardError, HazardErrorCategory, HazardResult};
