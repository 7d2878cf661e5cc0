//! Classical PSHA: per-rupture no-exceedance, aggregation into hazard
//! curves, block-parallel execution and statistics over realizations.

pub mod classical;
pub mod hazard_curve;
pub mod probability_map;
pub mod stats;
pub mod task;

pub use classical::{ClassicalCalculation, ClassicalOutput, Realization};
pub use hazard_curve::{
    HazardCurves, SourceCalculator, agg_curves, calc_hazard_curves, calc_hazard_curves_for_groups,
    pmap_from_group, poe_map, zero_curves,
};
pub use probability_map::ProbabilityMap;
pub use stats::{HazardMaps, compute_hazard_maps, mean_curve, quantile_curve};
pub use task::{Block, BlockAccumulator, ReducedBlock, TaskState, agg_dicts, run_blocks, split_in_blocks};
